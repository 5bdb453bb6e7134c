//! Currencies and their rounding.
//!
//! Amounts are `rust_decimal::Decimal` everywhere; a currency only decides how
//! many decimal places an amount keeps.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes the engine books in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Indonesian Rupiah
    Idr,
    /// Euro
    Eur,
    /// Singapore Dollar
    Sgd,
    /// Japanese Yen
    Jpy,
}

impl Currency {
    /// Number of decimal places amounts in this currency are rounded to.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::Jpy => 0,
            Self::Usd | Self::Idr | Self::Eur | Self::Sgd => 2,
        }
    }

    /// Rounds to the currency's precision, half to even.
    #[must_use]
    pub fn round(self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.decimal_places(), RoundingStrategy::MidpointNearestEven)
    }

    /// Returns true if `value` rounds to zero in this currency.
    #[must_use]
    pub fn is_zero(self, value: Decimal) -> bool {
        self.round(value).is_zero()
    }

    /// ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Idr => "IDR",
            Self::Eur => "EUR",
            Self::Sgd => "SGD",
            Self::Jpy => "JPY",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Usd, Self::Idr, Self::Eur, Self::Sgd, Self::Jpy]
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown currency: {s}"))
    }
}
