//! Multi-currency handling and exchange rates.

pub mod exchange;
pub mod rates;
pub mod service;

#[cfg(test)]
mod props;

pub use exchange::ExchangeRate;
pub use rates::{DEFAULT_RATE_CACHE_CAPACITY, RateCache, RateKey, RateTable};
pub use service::CurrencyService;
