//! Currency service for conversion and rounding.
//!
//! Every rounding in the engine goes through Banker's Rounding
//! (`MidpointNearestEven`) at the precision of the target currency.

use deprecia_shared::types::Currency;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Currency service for conversion operations.
pub struct CurrencyService;

impl CurrencyService {
    /// Convert amount using exchange rate, rounded to the target currency.
    ///
    /// # Arguments
    ///
    /// * `amount` - The source amount to convert
    /// * `rate` - The exchange rate (1 source = rate target)
    /// * `target` - The target currency, whose precision is used for rounding
    ///
    /// # Example
    ///
    /// ```
    /// use deprecia_core::currency::CurrencyService;
    /// use deprecia_shared::types::Currency;
    /// use rust_decimal_macros::dec;
    ///
    /// let result = CurrencyService::convert(dec!(100), dec!(1.5), Currency::Usd);
    /// assert_eq!(result, dec!(150.00));
    /// ```
    #[must_use]
    pub fn convert(amount: Decimal, rate: Decimal, target: Currency) -> Decimal {
        Self::round(amount * rate, target.decimal_places())
    }

    /// Round a decimal value using Banker's Rounding.
    ///
    /// # Arguments
    ///
    /// * `value` - The value to round
    /// * `decimal_places` - Number of decimal places
    #[must_use]
    pub fn round(value: Decimal, decimal_places: u32) -> Decimal {
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
    }
}
