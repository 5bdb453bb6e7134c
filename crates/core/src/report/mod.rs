//! Depreciation table.
//!
//! One row per asset with its children rolled in: gross value and accumulated
//! depreciation at the start and end of a date range, what was added and
//! disposed of in between, and the resulting book value. Amounts are
//! converted to the company currency at the rate of the acquisition date.

pub mod error;
pub mod service;
pub mod types;


pub use error::ReportError;
pub use service::DepreciationReportService;
pub use types::{Characteristics, DepreciationReport, ReportColumns, ReportOptions, ReportRow};
