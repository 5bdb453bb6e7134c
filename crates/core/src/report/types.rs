//! Depreciation table data types.

use std::ops::AddAssign;

use chrono::NaiveDate;
use deprecia_shared::types::{AccountId, AssetId, CompanyId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ReportError;

/// What the depreciation table covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// First day of the range.
    pub date_from: NaiveDate,
    /// Last day of the range.
    pub date_to: NaiveDate,
    /// Include draft entries; posted entries only otherwise.
    pub all_entries: bool,
    /// Companies to report on; every company when empty.
    pub company_ids: Vec<CompanyId>,
}

impl ReportOptions {
    /// Posted entries of every company between two dates.
    #[must_use]
    pub fn new(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self {
            date_from,
            date_to,
            all_entries: false,
            company_ids: Vec::new(),
        }
    }

    /// Includes or excludes draft entries.
    #[must_use]
    pub fn with_all_entries(mut self, all_entries: bool) -> Self {
        self.all_entries = all_entries;
        self
    }

    /// Restricts the table to the given companies.
    #[must_use]
    pub fn for_companies(mut self, company_ids: Vec<CompanyId>) -> Self {
        self.company_ids = company_ids;
        self
    }

    /// Checks the date range is not inverted.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` if `date_from` is after `date_to`.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.date_from > self.date_to {
            return Err(ReportError::InvalidDateRange {
                start: self.date_from,
                end: self.date_to,
            });
        }
        Ok(())
    }

    /// Returns true if assets of `company_id` are reported.
    #[must_use]
    pub fn includes_company(&self, company_id: CompanyId) -> bool {
        self.company_ids.is_empty() || self.company_ids.contains(&company_id)
    }
}

/// Descriptive columns of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    /// Acquisition date.
    pub acquisition_date: NaiveDate,
    /// First depreciation date, the imported one when the history was imported.
    pub first_depreciation_date: Option<NaiveDate>,
    /// Method label.
    pub method: String,
    /// Duration for linear methods (`"10 y"`, `"1 y 6 m"`), declining factor otherwise (`"30.00 %"`).
    pub duration_rate: String,
}

/// Amount columns of a row, in company currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportColumns {
    /// Gross value at the start of the range.
    pub asset_opening: Decimal,
    /// Gross value acquired within the range.
    pub asset_add: Decimal,
    /// Gross value disposed of within the range.
    pub asset_minus: Decimal,
    /// Gross value at the end of the range.
    pub asset_closing: Decimal,
    /// Accumulated depreciation at the start of the range.
    pub depreciation_opening: Decimal,
    /// Depreciation booked within the range.
    pub depreciation_add: Decimal,
    /// Accumulated depreciation written off by disposals.
    pub depreciation_minus: Decimal,
    /// Accumulated depreciation at the end of the range.
    pub depreciation_closing: Decimal,
    /// Closing gross value minus closing depreciation.
    pub book_value: Decimal,
}

impl ReportColumns {
    /// Columns in table order.
    #[must_use]
    pub const fn values(&self) -> [Decimal; 9] {
        [
            self.asset_opening,
            self.asset_add,
            self.asset_minus,
            self.asset_closing,
            self.depreciation_opening,
            self.depreciation_add,
            self.depreciation_minus,
            self.depreciation_closing,
            self.book_value,
        ]
    }
}

impl AddAssign for ReportColumns {
    fn add_assign(&mut self, other: Self) {
        self.asset_opening += other.asset_opening;
        self.asset_add += other.asset_add;
        self.asset_minus += other.asset_minus;
        self.asset_closing += other.asset_closing;
        self.depreciation_opening += other.depreciation_opening;
        self.depreciation_add += other.depreciation_add;
        self.depreciation_minus += other.depreciation_minus;
        self.depreciation_closing += other.depreciation_closing;
        self.book_value += other.book_value;
    }
}

/// One asset, its children rolled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Asset ID.
    pub asset_id: AssetId,
    /// Asset name.
    pub name: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// Gross value account.
    pub account_id: Option<AccountId>,
    /// Code of the gross value account.
    pub account_code: Option<String>,
    /// Descriptive columns.
    pub characteristics: Characteristics,
    /// Amount columns.
    pub columns: ReportColumns,
}

/// The depreciation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationReport {
    /// First day of the range.
    pub date_from: NaiveDate,
    /// Last day of the range.
    pub date_to: NaiveDate,
    /// Whether draft entries were included.
    pub all_entries: bool,
    /// Rows, by asset account code then acquisition date.
    pub rows: Vec<ReportRow>,
    /// Sum of every row.
    pub total: ReportColumns,
}
