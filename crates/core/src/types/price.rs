//! Money in Vietnamese dong.
//!
//! Prices are stored as `numeric(12,0)` and carried as [`Decimal`] so that
//! sums and comparisons never go through floating point. VND has no minor
//! unit, so every amount is a whole number of dong.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount in Vietnamese dong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero dong.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of dong.
    #[must_use]
    pub fn from_dong(dong: i64) -> Self {
        Self(Decimal::from(dong))
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display, e.g. `1.250.000 ₫`.
    ///
    /// ```
    /// use kilala_core::Price;
    ///
    /// assert_eq!(Price::from_dong(1_250_000).format_vnd(), "1.250.000 ₫");
    /// assert_eq!(Price::from_dong(0).format_vnd(), "0 ₫");
    /// ```
    #[must_use]
    pub fn format_vnd(&self) -> String {
        let rounded = self.0.round();
        let digits = rounded.abs().trunc().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        if rounded.is_sign_negative() && !rounded.is_zero() {
            format!("-{grouped} ₫")
        } else {
            format!("{grouped} ₫")
        }
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

/// The price a customer actually pays for a product.
///
/// A sale price only applies when it is strictly lower than the list price.
#[must_use]
pub fn effective_price(price: Decimal, sale_price: Option<Decimal>) -> Decimal {
    match sale_price {
        Some(sale) if sale < price => sale,
        _ => price,
    }
}

/// Flat-rate shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    /// Fee charged below the threshold.
    pub flat_fee: Decimal,
    /// Subtotal at or above which shipping is free.
    pub free_threshold: Decimal,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            flat_fee: Decimal::from(30_000),
            free_threshold: Decimal::from(500_000),
        }
    }
}

impl ShippingPolicy {
    /// Shipping fee for an order subtotal.
    ///
    /// An empty order ships for free so that an empty cart shows a zero total.
    #[must_use]
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO || subtotal >= self.free_threshold {
            Decimal::ZERO
        } else {
            self.flat_fee
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_vnd_groups_thousands() {
        assert_eq!(Price::from_dong(999).format_vnd(), "999 ₫");
        assert_eq!(Price::from_dong(1_000).format_vnd(), "1.000 ₫");
        assert_eq!(Price::from_dong(35_000).format_vnd(), "35.000 ₫");
        assert_eq!(Price::from_dong(12_345_678).format_vnd(), "12.345.678 ₫");
    }

    #[test]
    fn test_format_vnd_rounds_and_signs() {
        assert_eq!(Price::new(Decimal::new(2_999_995, 1)).format_vnd(), "300.000 ₫");
        assert_eq!(Price::from_dong(-30_000).format_vnd(), "-30.000 ₫");
    }

    #[test]
    fn test_effective_price() {
        let list = Decimal::from(250_000);
        assert_eq!(effective_price(list, None), list);
        assert_eq!(effective_price(list, Some(Decimal::from(199_000))), Decimal::from(199_000));
        // A "sale" price that is not lower is ignored
        assert_eq!(effective_price(list, Some(Decimal::from(260_000))), list);
        assert_eq!(effective_price(list, Some(list)), list);
    }

    #[test]
    fn test_shipping_fee_threshold() {
        let policy = ShippingPolicy::default();
        assert_eq!(policy.fee_for(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(policy.fee_for(Decimal::from(120_000)), Decimal::from(30_000));
        assert_eq!(policy.fee_for(Decimal::from(499_999)), Decimal::from(30_000));
        assert_eq!(policy.fee_for(Decimal::from(500_000)), Decimal::ZERO);
    }
}
