//! Schedule generation errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while generating a depreciation schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Declining rate outside `(0, 1]`.
    #[error("Declining factor must be greater than 0 and at most 1, got {0}")]
    InvalidProgressFactor(Decimal),

    /// Fiscal year end is not a calendar day.
    #[error("Invalid fiscal year end: month {month}, day {day}")]
    InvalidFiscalYearEnd {
        /// Month of the fiscal year end.
        month: u32,
        /// Day of the fiscal year end.
        day: u32,
    },

    /// Salvage or imported depreciation exceed the original value.
    #[error("Invalid asset values: {0}")]
    InvalidValues(String),

    /// Date arithmetic left the supported calendar range.
    #[error("Date out of range after {0}")]
    DateOutOfRange(NaiveDate),
}

impl ScheduleError {
    /// Returns the error code for machine-readable output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidProgressFactor(_) => "INVALID_PROGRESS_FACTOR",
            Self::InvalidFiscalYearEnd { .. } => "INVALID_FISCAL_YEAR_END",
            Self::InvalidValues(_) => "INVALID_VALUES",
            Self::DateOutOfRange(_) => "DATE_OUT_OF_RANGE",
        }
    }
}
