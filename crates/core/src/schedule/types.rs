//! Schedule inputs and outputs.

use chrono::NaiveDate;
use deprecia_shared::types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::dates::{FiscalYearEnd, first_depreciation_date, next_period_date, prorata_factor};
use super::error::ScheduleError;
use crate::asset::{Asset, DepreciationMethod, MethodPeriod};

/// What is already booked on an asset when its schedule is (re)generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostedHistory {
    /// Number of posted, unreversed ordinary depreciation entries.
    pub entries: u32,
    /// Depreciation posted by this book (imports excluded).
    pub depreciated: Decimal,
    /// Residual value still to depreciate.
    pub residual: Decimal,
    /// Date of the last posted ordinary depreciation entry.
    pub last_date: Option<NaiveDate>,
}

impl PostedHistory {
    /// History of an asset with nothing posted yet.
    #[must_use]
    pub fn fresh(asset: &Asset) -> Self {
        Self {
            residual: asset.opening_residual(),
            ..Self::default()
        }
    }
}

/// Parameters of one schedule generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleParams {
    /// Depreciation method.
    pub method: DepreciationMethod,
    /// Declining rate.
    pub progress_factor: Decimal,
    /// Length of one period.
    pub method_period: MethodPeriod,
    /// Full periods still to depreciate, excluding a pro-rata stub.
    pub periods: u32,
    /// Share of the first period to depreciate; `Some` adds a stub installment.
    pub prorata_factor: Option<Decimal>,
    /// Date of the first generated installment.
    pub start_date: NaiveDate,
    /// Amount the generated installments sum to.
    pub amount_to_depreciate: Decimal,
    /// Depreciation already booked before the first generated installment.
    pub already_depreciated: Decimal,
    /// Currency whose precision installments are rounded to.
    pub currency: Currency,
    /// Fiscal year end yearly installments stay on.
    pub fiscal_year_end: FiscalYearEnd,
}

impl ScheduleParams {
    /// Builds the parameters for the remaining schedule of an asset.
    ///
    /// The number of periods is the asset's `method_number` minus imported and
    /// posted periods. Generation restarts one period after the last posted entry.
    /// A pro-rata stub is only added to a schedule with nothing posted yet.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid declining factor, inconsistent values or
    /// an invalid fiscal year end.
    pub fn for_asset(
        asset: &Asset,
        history: &PostedHistory,
        fiscal_year_end: FiscalYearEnd,
        ignore_prorata: bool,
    ) -> Result<Self, ScheduleError> {
        let terms = &asset.terms;
        if terms.method != DepreciationMethod::Linear
            && (terms.progress_factor <= Decimal::ZERO || terms.progress_factor > Decimal::ONE)
        {
            return Err(ScheduleError::InvalidProgressFactor(terms.progress_factor));
        }
        if asset.salvage_value.abs() > asset.original_value.abs() {
            return Err(ScheduleError::InvalidValues(format!(
                "salvage value {} exceeds original value {}",
                asset.salvage_value, asset.original_value
            )));
        }
        if asset.already_depreciated_amount_import.abs() > asset.depreciable_base().abs() {
            return Err(ScheduleError::InvalidValues(format!(
                "imported depreciation {} exceeds depreciable value {}",
                asset.already_depreciated_amount_import,
                asset.depreciable_base()
            )));
        }

        let first_date = match asset.first_depreciation_date {
            Some(date) => date,
            None => {
                let start = if terms.prorata {
                    asset.prorata_start()
                } else {
                    asset.acquisition_date
                };
                first_depreciation_date(start, terms.method_period, fiscal_year_end)?
            }
        };
        let start_date = match history.last_date {
            Some(last) if last >= first_date => next_period_date(last, terms.method_period, fiscal_year_end)?,
            _ => first_date,
        };

        // Once posted, the pro-rata stub is one of the history entries on top of
        // the regular periods.
        let stub_posted = terms.prorata && !ignore_prorata && history.entries > 0;
        let periods = (terms.method_number + u32::from(stub_posted))
            .saturating_sub(asset.depreciation_number_import)
            .saturating_sub(history.entries);
        let prorata_factor = if terms.prorata && !ignore_prorata && history.entries == 0 && periods > 0 {
            Some(prorata_factor(asset.prorata_start(), start_date, terms.method_period)?)
        } else {
            None
        };

        Ok(Self {
            method: terms.method,
            progress_factor: terms.progress_factor,
            method_period: terms.method_period,
            periods,
            prorata_factor,
            start_date,
            amount_to_depreciate: history.residual,
            already_depreciated: history.depreciated,
            currency: asset.currency,
            fiscal_year_end,
        })
    }

    /// Number of installments the schedule is made of before zero amounts are skipped.
    #[must_use]
    pub fn installment_count(&self) -> u32 {
        if self.periods == 0 {
            0
        } else {
            self.periods + u32::from(self.prorata_factor.is_some())
        }
    }
}

/// One scheduled depreciation amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Position in the schedule (1-based, stub included).
    pub sequence: u32,
    /// Number shown in references; the pro-rata stub is number 0.
    pub number: u32,
    /// Date of the entry.
    pub date: NaiveDate,
    /// Amount depreciated by this installment.
    pub amount: Decimal,
    /// Cumulative depreciation after this installment.
    pub depreciated_value: Decimal,
    /// Residual value after this installment.
    pub remaining_value: Decimal,
    /// Whether this is the pro-rated stub.
    pub prorata: bool,
}
