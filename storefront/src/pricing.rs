//! Quantity discount policy and order totals.

use crate::money::Money;
use crate::types::LineItem;

/// Units of one product needed before the quantity discount applies
pub const DISCOUNT_THRESHOLD: u32 = 3;

/// Quantity discount, in percent of the line's original price
pub const DISCOUNT_PERCENT: u32 = 10;

/// Pricing of a single line, computed from scratch for a quantity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinePricing {
    /// Unit price × quantity
    pub original: Money,
    /// Quantity discount
    pub discount: Money,
    /// `original - discount`
    pub discounted: Money,
}

impl LinePricing {
    /// Prices `quantity` units at `unit_price`
    #[must_use]
    pub const fn for_quantity(unit_price: Money, quantity: u32) -> Self {
        let original = unit_price.times(quantity);
        let discount = if quantity >= DISCOUNT_THRESHOLD {
            original.percent(DISCOUNT_PERCENT)
        } else {
            Money::ZERO
        };
        Self {
            original,
            discount,
            discounted: Money::from_cents(original.cents() - discount.cents()),
        }
    }
}

/// Totals over a list of line items
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderTotals {
    /// Sum of original prices
    pub subtotal: Money,
    /// Sum of discounts
    pub total_discount: Money,
    /// `subtotal - total_discount`
    pub total: Money,
    /// Sum of quantities, saturating at `u32::MAX`
    pub units: u32,
}

impl OrderTotals {
    /// Computes totals for `items`
    #[must_use]
    pub fn from_items(items: &[LineItem]) -> Self {
        let subtotal: Money = items.iter().map(|item| item.original_price).sum();
        let total_discount: Money = items.iter().map(|item| item.discount).sum();
        Self {
            subtotal,
            total_discount,
            total: subtotal - total_discount,
            units: items
                .iter()
                .map(|item| item.quantity)
                .fold(0, u32::saturating_add),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;
    use proptest::prelude::*;

    #[test]
    fn no_discount_below_threshold() {
        let pricing = LinePricing::for_quantity(Money::from_cents(500), 2);
        assert_eq!(pricing.original, Money::from_cents(1000));
        assert_eq!(pricing.discount, Money::ZERO);
        assert_eq!(pricing.discounted, Money::from_cents(1000));
    }

    #[test]
    fn discount_at_threshold() {
        let pricing = LinePricing::for_quantity(Money::from_cents(1299), 3);
        assert_eq!(pricing.original, Money::from_cents(3897));
        assert_eq!(pricing.discount, Money::from_cents(390));
        assert_eq!(pricing.discounted, Money::from_cents(3507));
    }

    #[test]
    fn totals_sum_lines() {
        let items = vec![
            LineItem::new(Product::new("1", "A", Money::from_cents(500), vec![]), 3),
            LineItem::new(Product::new("2", "B", Money::from_cents(250), vec![]), 2),
        ];
        let totals = OrderTotals::from_items(&items);
        assert_eq!(totals.subtotal, Money::from_cents(2000));
        assert_eq!(totals.total_discount, Money::from_cents(150));
        assert_eq!(totals.total, Money::from_cents(1850));
        assert_eq!(totals.units, 5);
        assert_eq!(OrderTotals::from_items(&[]), OrderTotals::default());
    }

    #[test]
    fn unit_count_saturates_with_capped_line() {
        let items = vec![
            LineItem::new(Product::new("1", "A", Money::from_cents(500), vec![]), u32::MAX),
            LineItem::new(Product::new("2", "B", Money::from_cents(250), vec![]), 1),
        ];
        assert_eq!(OrderTotals::from_items(&items).units, u32::MAX);
    }

    proptest! {
        #[test]
        fn discount_follows_threshold(cents in 1i64..1_000_000, quantity in 1u32..100) {
            let pricing = LinePricing::for_quantity(Money::from_cents(cents), quantity);
            if quantity < DISCOUNT_THRESHOLD {
                prop_assert_eq!(pricing.discount, Money::ZERO);
            } else {
                // Half-up rounding of 10%
                let expected = (cents * i64::from(quantity) + 5) / 10;
                prop_assert_eq!(pricing.discount.cents(), expected);
            }
            prop_assert_eq!(pricing.original, pricing.discounted + pricing.discount);
        }
    }
}
