//! Depreciation report errors.

use chrono::NaiveDate;
use deprecia_shared::AppError;
use deprecia_shared::types::{CompanyId, Currency};
use thiserror::Error;

/// Errors that can occur while building the depreciation table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// No rate converts an asset's currency to its company's currency.
    #[error("No exchange rate found for {from} to {to} on {date}")]
    NoExchangeRate {
        /// Asset currency.
        from: Currency,
        /// Company currency.
        to: Currency,
        /// Acquisition date of the asset.
        date: NaiveDate,
    },

    /// An asset refers to an unknown company.
    #[error("Company not found: {0}")]
    CompanyNotFound(CompanyId),
}

impl ReportError {
    /// Returns the error code for machine-readable output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::NoExchangeRate { .. } => "NO_EXCHANGE_RATE",
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        let message = err.to_string();
        match err {
            ReportError::InvalidDateRange { .. } => Self::Validation(message),
            ReportError::NoExchangeRate { .. } => Self::Configuration(message),
            ReportError::CompanyNotFound(_) => Self::NotFound(message),
        }
    }
}
