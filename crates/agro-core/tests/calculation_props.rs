use agro_core::{calculate, Cart, Money, Percent};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn rate(hundredths: u32) -> Percent {
    Percent::new(Decimal::new(i64::from(hundredths), 2)).unwrap()
}

fn lines() -> impl Strategy<Value = Vec<(i64, i64)>> {
    // (price in paise, quantity)
    prop::collection::vec((1i64..1_000_000, 1i64..200), 0..20)
}

fn build_cart(lines: &[(i64, i64)]) -> Cart {
    let mut cart = Cart::new();
    for (i, (price, qty)) in lines.iter().enumerate() {
        cart.add_custom(&format!("Item {i}"), *qty, Money::from_cents(*price)).unwrap();
    }
    cart
}

proptest! {
    #[test]
    fn subtotal_is_sum_of_line_totals(lines in lines()) {
        let cart = build_cart(&lines);
        let sum: Money = cart.items().iter().map(|l| l.line_total()).sum();
        prop_assert_eq!(calculate(&cart, Percent::zero(), Percent::zero()).subtotal, sum);
    }

    #[test]
    fn grand_total_cascades(lines in lines(), d in 0u32..=10_000, t in 0u32..=10_000) {
        let cart = build_cart(&lines);
        let bill = calculate(&cart, rate(d), rate(t));

        let hundred = Decimal::ONE_HUNDRED;
        let s = bill.subtotal.amount();
        let expected = s * (Decimal::ONE - rate(d).value() / hundred) * (Decimal::ONE + rate(t).value() / hundred);

        prop_assert!((bill.grand_total.amount() - expected).abs() <= Decimal::new(1, 9));
        prop_assert_eq!(bill.discounted_subtotal + bill.tax_amount, bill.grand_total);
    }

    #[test]
    fn repeated_adds_merge(price in 1i64..100_000, q1 in 1i64..500, q2 in 1i64..500) {
        let mut cart = Cart::new();
        cart.add_custom("Urea (46-0-0)", q1, Money::from_cents(price)).unwrap();
        cart.add_custom("Urea (46-0-0)", q2, Money::from_cents(price)).unwrap();

        prop_assert_eq!(cart.len(), 1);
        let line = &cart.items()[0];
        prop_assert_eq!(line.quantity(), q1 + q2);
        prop_assert_eq!(line.line_total(), Money::from_cents(price).multiply_quantity(q1 + q2));
    }

    #[test]
    fn rounding_only_touches_presentation(lines in lines(), d in 0u32..=10_000, t in 0u32..=10_000) {
        let cart = build_cart(&lines);
        let bill = calculate(&cart, rate(d), rate(t));
        let shown = bill.rounded();

        prop_assert!((shown.grand_total.amount() - bill.grand_total.amount()).abs() <= Decimal::new(5, 3));
        prop_assert_eq!(calculate(&cart, rate(d), rate(t)), bill);
    }
}
