//! Depreciation schedule computation.
//!
//! Turns an asset's depreciation terms into dated installments:
//! - Linear, declining and declining-then-linear methods
//! - Monthly or yearly periods aligned on month ends or the fiscal year end
//! - Optional pro-rata first period
//! - Regeneration of the remaining schedule after posted entries

pub mod dates;
pub mod error;
pub mod generator;
pub mod types;

#[cfg(test)]
mod generator_props;

pub use dates::{FiscalYearEnd, first_depreciation_date, month_end, next_period_date, prorata_factor};
pub use error::ScheduleError;
pub use generator::ScheduleGenerator;
pub use types::{Installment, PostedHistory, ScheduleParams};
