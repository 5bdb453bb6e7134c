//! Property-based tests for currency operations.
//!
//! - Banker's Rounding correctness at currency precision
//! - Rate lookup through the inverse of the opposite pair

use chrono::NaiveDate;
use deprecia_shared::types::{CompanyId, Currency};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::exchange::ExchangeRate;
use super::rates::{RateCache, RateKey, RateTable};
use super::service::CurrencyService;

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn currency() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::Usd),
        Just(Currency::Idr),
        Just(Currency::Eur),
        Just(Currency::Sgd),
        Just(Currency::Jpy),
    ]
}

/// Strategy to generate days offsets within a few years.
fn day_offset() -> impl Strategy<Value = i64> {
    0i64..2000
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Conversion results carry at most the target currency's decimal places.
    #[test]
    fn prop_convert_rounds_to_currency_precision(
        amount in positive_amount(),
        rate in positive_rate(),
        target in currency(),
    ) {
        let result = CurrencyService::convert(amount, rate, target);
        prop_assert!(result.scale() <= target.decimal_places());
    }

    /// Rounding is idempotent.
    #[test]
    fn prop_round_is_idempotent(
        amount in positive_amount(),
        rate in positive_rate(),
        target in currency(),
    ) {
        let once = target.round(amount * rate);
        prop_assert_eq!(target.round(once), once);
    }

    /// Converting with a rate of one only rounds.
    #[test]
    fn prop_same_currency_preserves_amount(amount in positive_amount()) {
        prop_assert_eq!(CurrencyService::convert(amount, Decimal::ONE, Currency::Usd), amount);
    }

    /// A pair without a direct rate is served by the inverse of the opposite pair.
    #[test]
    fn prop_inverse_lookup(
        rate in positive_rate(),
        effective in day_offset(),
        query in day_offset(),
    ) {
        let effective_date = base_date() + chrono::Duration::days(effective);
        let query_date = base_date() + chrono::Duration::days(query);
        let mut table = RateTable::new();
        table.add(ExchangeRate::new(Currency::Eur, Currency::Usd, rate, effective_date));

        let direct = table.lookup(Currency::Eur, Currency::Usd, query_date);
        let inverse = table.lookup(Currency::Usd, Currency::Eur, query_date);
        if query_date < effective_date {
            prop_assert!(direct.is_none());
            prop_assert!(inverse.is_none());
        } else {
            prop_assert_eq!(direct, Some(rate));
            prop_assert_eq!(inverse, Some(Decimal::ONE / rate));
        }
    }

    /// The cache returns what the table returns.
    #[test]
    fn prop_cache_agrees_with_table(
        rate in positive_rate(),
        query in day_offset(),
    ) {
        let mut table = RateTable::new();
        table.add(ExchangeRate::new(Currency::Sgd, Currency::Idr, rate, base_date()));
        let cache = RateCache::with_capacity(16);
        let key = RateKey {
            from: Currency::Idr,
            to: Currency::Sgd,
            company_id: CompanyId::new(),
            date: base_date() + chrono::Duration::days(query),
        };
        let expected = table.lookup(key.from, key.to, key.date);
        prop_assert_eq!(cache.get_or_lookup(&table, key), expected);
        prop_assert_eq!(cache.get_or_lookup(&table, key), expected);
    }
}
