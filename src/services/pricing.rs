//! Cart arithmetic: subtotal, nutrition totals, and coupon discounts.
//!
//! Pure computation over whole currency units; validation of quantities and
//! prices happens before lines reach this module.

use crate::entities::coupon::{self, CouponKind};

/// Inputs a cart line contributes to the totals.
#[derive(Debug, Clone, Copy)]
pub struct PricedLine {
    pub unit_price: i64,
    pub protein_per_unit: i64,
    pub calories_per_unit: i64,
    pub quantity: i64,
}

/// Summed cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: i64,
    pub total_protein: i64,
    pub total_calories: i64,
}

/// Sums `unit_price × qty`, `protein × qty` and `calories × qty` across lines.
pub fn compute_totals(lines: &[PricedLine]) -> CartTotals {
    let mut totals = CartTotals {
        subtotal: 0,
        total_protein: 0,
        total_calories: 0,
    };

    for line in lines {
        totals.subtotal += line.unit_price * line.quantity;
        totals.total_protein += line.protein_per_unit * line.quantity;
        totals.total_calories += line.calories_per_unit * line.quantity;
    }

    totals
}

/// Discount a coupon grants against `subtotal`.
///
/// Flat coupons discount their face value; percent coupons discount
/// `round(subtotal × value / 100)` (half-up), capped by `max_discount` when
/// nonzero. The result never exceeds the subtotal.
pub fn compute_discount(subtotal: i64, coupon: &coupon::Model) -> i64 {
    let mut discount = match coupon.kind {
        CouponKind::Flat => coupon.value,
        CouponKind::Percent => {
            let raw = (subtotal * coupon.value + 50) / 100;
            if coupon.max_discount > 0 {
                raw.min(coupon.max_discount)
            } else {
                raw
            }
        }
    };

    discount = discount.min(subtotal);
    discount.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn coupon(kind: CouponKind, value: i64, max_discount: i64) -> coupon::Model {
        coupon::Model {
            id: Uuid::new_v4(),
            code: "TEST".into(),
            kind,
            value,
            min_cart_total: 0,
            max_discount,
            valid_from: None,
            valid_to: None,
            expires_at: None,
            is_active: true,
            usage_limit_total: 0,
            usage_limit_per_user: 1,
            used_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn totals_sum_price_protein_and_calories() {
        let lines = [
            PricedLine {
                unit_price: 200,
                protein_per_unit: 30,
                calories_per_unit: 400,
                quantity: 2,
            },
            PricedLine {
                unit_price: 150,
                protein_per_unit: 10,
                calories_per_unit: 250,
                quantity: 1,
            },
        ];

        let totals = compute_totals(&lines);
        assert_eq!(totals.subtotal, 550);
        assert_eq!(totals.total_protein, 70);
        assert_eq!(totals.total_calories, 1050);
    }

    #[test]
    fn totals_of_empty_cart_are_zero() {
        let totals = compute_totals(&[]);
        assert_eq!(totals.subtotal, 0);
        assert_eq!(totals.total_protein, 0);
        assert_eq!(totals.total_calories, 0);
    }

    #[test]
    fn percent_discount_without_cap() {
        let c = coupon(CouponKind::Percent, 10, 0);
        assert_eq!(compute_discount(1000, &c), 100);
    }

    #[test]
    fn percent_discount_respects_cap() {
        let c = coupon(CouponKind::Percent, 10, 50);
        assert_eq!(compute_discount(1000, &c), 50);
    }

    #[test]
    fn percent_discount_rounds_half_up() {
        // 5% of 250 = 12.5 -> 13
        let c = coupon(CouponKind::Percent, 5, 0);
        assert_eq!(compute_discount(250, &c), 13);
    }

    #[test]
    fn flat_discount_capped_at_subtotal() {
        let c = coupon(CouponKind::Flat, 100, 0);
        assert_eq!(compute_discount(40, &c), 40);
    }

    proptest! {
        #[test]
        fn discount_never_exceeds_subtotal(
            subtotal in 0i64..1_000_000,
            value in 0i64..10_000,
            max_discount in 0i64..10_000,
            flat in proptest::bool::ANY,
        ) {
            let kind = if flat { CouponKind::Flat } else { CouponKind::Percent };
            let c = coupon(kind, value, max_discount);
            let discount = compute_discount(subtotal, &c);
            prop_assert!(discount >= 0);
            prop_assert!(discount <= subtotal);
        }

        #[test]
        fn totals_scale_with_quantity(
            price in 0i64..10_000,
            protein in 0i64..500,
            calories in 0i64..5_000,
            qty in 1i64..50,
        ) {
            let line = PricedLine {
                unit_price: price,
                protein_per_unit: protein,
                calories_per_unit: calories,
                quantity: qty,
            };
            let totals = compute_totals(&[line]);
            prop_assert_eq!(totals.subtotal, price * qty);
            prop_assert_eq!(totals.total_protein, protein * qty);
            prop_assert_eq!(totals.total_calories, calories * qty);
        }
    }
}
