use agro_core::{
    calculate, render_receipt, Cart, InvoiceNumber, Money, PaymentMethod, Percent, ReceiptHeader,
    ShopSettings,
};
use chrono::NaiveDate;

// Rates print without trailing zeros: `Discount (10%)`, `GST (18%)`, never
// `Discount (10.0%)`. A typed "10.0" and a typed "10" give the same receipt.
const GOLDEN: &str = include_str!("golden/receipt_basic.txt");

fn header() -> ReceiptHeader {
    let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    ReceiptHeader {
        invoice_number: InvoiceNumber::new(day, 1),
        issued_at: day.and_hms_opt(10, 30, 0).unwrap(),
        customer_name: Some("Ramesh Kumar".to_string()),
        payment_method: PaymentMethod::Cash,
    }
}

fn cart() -> Cart {
    let mut cart = Cart::new();
    cart.add_custom("Urea (46-0-0)", 2, Money::from_cents(35000)).unwrap();
    cart.add_custom("DAP (18-46-0)", 1, Money::from_cents(135000)).unwrap();
    cart
}

#[test]
fn test_receipt_matches_golden_file() {
    let cart = cart();
    let totals = calculate(&cart, Percent::from_whole(10), Percent::from_whole(18));
    let text = render_receipt(&ShopSettings::default(), &header(), cart.items(), &totals);

    for (line_no, (got, want)) in text.lines().zip(GOLDEN.lines()).enumerate() {
        assert_eq!(got, want, "receipt differs at line {}", line_no + 1);
    }
    assert_eq!(text, GOLDEN);
}

#[test]
fn test_receipt_is_byte_identical_across_renders() {
    let settings = ShopSettings::default();
    let renders: Vec<String> = (0..3)
        .map(|_| {
            let cart = cart();
            let totals = calculate(&cart, Percent::from_whole(10), Percent::from_whole(18));
            render_receipt(&settings, &header(), cart.items(), &totals)
        })
        .collect();
    assert!(renders.windows(2).all(|pair| pair[0].as_bytes() == pair[1].as_bytes()));
}

#[test]
fn test_rate_labels_drop_trailing_zeros() {
    use agro_core::validation::parse_rate;

    let cart = cart();
    let discount = parse_rate("discount", "10.0").unwrap();
    let tax = parse_rate("tax", "18.00").unwrap();
    let totals = calculate(&cart, discount, tax);
    let text = render_receipt(&ShopSettings::default(), &header(), cart.items(), &totals);
    assert_eq!(text, GOLDEN);

    let half = parse_rate("discount", "12.5").unwrap();
    let totals = calculate(&cart, half, tax);
    let text = render_receipt(&ShopSettings::default(), &header(), cart.items(), &totals);
    assert!(text.contains("Discount (12.5%):"));
}
