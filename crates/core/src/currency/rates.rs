//! Exchange rate lookup and memoisation.

use chrono::NaiveDate;
use deprecia_shared::types::{CompanyId, Currency};
use moka::sync::Cache;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::exchange::ExchangeRate;
use crate::asset::AssetError;

/// Default number of memoised rates.
pub const DEFAULT_RATE_CACHE_CAPACITY: u64 = 1024;

/// Table of known exchange rates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: Vec<ExchangeRate>,
}

impl RateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rate.
    pub fn add(&mut self, rate: ExchangeRate) {
        self.rates.push(rate);
    }

    /// Returns the number of rates in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if the table holds no rate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Looks up the rate converting `from` into `to` on `date`.
    ///
    /// Same currency is 1. Otherwise the latest direct rate effective on or
    /// before `date` wins; failing that, the inverse of the latest opposite rate.
    #[must_use]
    pub fn lookup(&self, from: Currency, to: Currency, date: NaiveDate) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        self.latest(from, to, date)
            .map(|r| r.rate)
            .or_else(|| self.latest(to, from, date).and_then(ExchangeRate::inverse).map(|r| r.rate))
    }

    /// Same as [`Self::lookup`], failing when no rate is known.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::NoExchangeRate` when neither the pair nor its
    /// opposite has a rate effective on or before `date`.
    pub fn rate(&self, from: Currency, to: Currency, date: NaiveDate) -> Result<Decimal, AssetError> {
        self.lookup(from, to, date)
            .ok_or(AssetError::NoExchangeRate { from, to, date })
    }

    fn latest(&self, from: Currency, to: Currency, date: NaiveDate) -> Option<&ExchangeRate> {
        self.rates
            .iter()
            .filter(|r| r.converts(from, to) && r.effective_date <= date)
            .max_by_key(|r| r.effective_date)
    }
}

/// Key of a memoised rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateKey {
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
    /// Company the conversion is made for.
    pub company_id: CompanyId,
    /// Conversion date.
    pub date: NaiveDate,
}

/// Memoised rate lookups, shared by one report render.
#[derive(Clone)]
pub struct RateCache {
    cache: Cache<RateKey, Option<Decimal>>,
}

impl RateCache {
    /// Creates a cache with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RATE_CACHE_CAPACITY)
    }

    /// Creates a cache holding at most `max_capacity` rates.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// Returns the rate for `key`, looking it up in `table` on a miss.
    #[must_use]
    pub fn get_or_lookup(&self, table: &RateTable, key: RateKey) -> Option<Decimal> {
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }
        let rate = table.lookup(key.from, key.to, key.date);
        self.cache.insert(key, rate);
        rate
    }

    /// Returns true if `key` has been looked up already.
    #[must_use]
    pub fn contains(&self, key: &RateKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Invalidates all memoised rates.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}
