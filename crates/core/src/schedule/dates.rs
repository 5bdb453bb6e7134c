//! Calendar rules for depreciation dates.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ScheduleError;
use crate::asset::MethodPeriod;

/// Last day of a company's fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearEnd {
    /// Month (1-12).
    pub month: u32,
    /// Day of month; clamped to the month's last day.
    pub day: u32,
}

impl Default for FiscalYearEnd {
    fn default() -> Self {
        Self { month: 12, day: 31 }
    }
}

impl FiscalYearEnd {
    /// Creates a fiscal year end.
    #[must_use]
    pub const fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    /// Fiscal year end falling in `year`.
    pub fn in_year(self, year: i32) -> Result<NaiveDate, ScheduleError> {
        let invalid = ScheduleError::InvalidFiscalYearEnd {
            month: self.month,
            day: self.day,
        };
        if self.day == 0 {
            return Err(invalid);
        }
        let first = NaiveDate::from_ymd_opt(year, self.month, 1).ok_or(invalid)?;
        let last = month_end(first)?;
        // A year ending on 28 February ends on the 29th in leap years.
        let day = if self.month == 2 && self.day >= 28 {
            last.day()
        } else {
            self.day.min(last.day())
        };
        NaiveDate::from_ymd_opt(year, self.month, day).ok_or(ScheduleError::DateOutOfRange(first))
    }

    /// First fiscal year end on or after `date`.
    pub fn on_or_after(self, date: NaiveDate) -> Result<NaiveDate, ScheduleError> {
        let end = self.in_year(date.year())?;
        if end < date {
            self.in_year(date.year() + 1)
        } else {
            Ok(end)
        }
    }
}

/// Last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> Result<NaiveDate, ScheduleError> {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .ok_or(ScheduleError::DateOutOfRange(date))
}

/// Date of the installment following one dated `date`.
///
/// Monthly schedules stay on month ends. A yearly installment dated on a
/// fiscal year end is followed by the next fiscal year end; other yearly
/// dates move by twelve months.
pub fn next_period_date(
    date: NaiveDate,
    period: MethodPeriod,
    fiscal_year_end: FiscalYearEnd,
) -> Result<NaiveDate, ScheduleError> {
    let next = date
        .checked_add_months(Months::new(period.months()))
        .ok_or(ScheduleError::DateOutOfRange(date))?;
    match period {
        MethodPeriod::Monthly => month_end(next),
        MethodPeriod::Yearly if fiscal_year_end.in_year(date.year())? == date => fiscal_year_end.in_year(next.year()),
        MethodPeriod::Yearly => Ok(next),
    }
}

/// Computes the first depreciation date from the start of depreciation.
///
/// Monthly: end of the start month. Yearly: first fiscal year end on or after the start.
pub fn first_depreciation_date(
    start: NaiveDate,
    period: MethodPeriod,
    fiscal_year_end: FiscalYearEnd,
) -> Result<NaiveDate, ScheduleError> {
    match period {
        MethodPeriod::Monthly => month_end(start),
        MethodPeriod::Yearly => fiscal_year_end.on_or_after(start),
    }
}

/// Share of the period ending on `first_date` that elapses from `start` (inclusive).
///
/// Clamped to `[0, 1]`.
pub fn prorata_factor(
    start: NaiveDate,
    first_date: NaiveDate,
    period: MethodPeriod,
) -> Result<Decimal, ScheduleError> {
    let period_start = match period {
        MethodPeriod::Monthly => first_date
            .checked_sub_months(Months::new(1))
            .ok_or(ScheduleError::DateOutOfRange(first_date))
            .and_then(month_end)?,
        MethodPeriod::Yearly => first_date
            .checked_sub_months(Months::new(12))
            .ok_or(ScheduleError::DateOutOfRange(first_date))?,
    };
    let period_days = (first_date - period_start).num_days().max(1);
    let elapsed = ((first_date - start).num_days() + 1).clamp(0, period_days);
    Ok(Decimal::from(elapsed) / Decimal::from(period_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2021, 1, 16), date(2021, 1, 31))]
    #[case(date(2024, 2, 1), date(2024, 2, 29))]
    #[case(date(2023, 2, 28), date(2023, 2, 28))]
    #[case(date(2021, 12, 5), date(2021, 12, 31))]
    fn test_month_end(#[case] input: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(month_end(input).unwrap(), expected);
    }

    #[test]
    fn test_next_period_date_monthly_stays_on_month_end() {
        let jan = date(2021, 1, 31);
        let calendar = FiscalYearEnd::default();
        let feb = next_period_date(jan, MethodPeriod::Monthly, calendar).unwrap();
        assert_eq!(feb, date(2021, 2, 28));
        let mar = next_period_date(feb, MethodPeriod::Monthly, calendar).unwrap();
        assert_eq!(mar, date(2021, 3, 31));
    }

    #[rstest]
    #[case::calendar_year(FiscalYearEnd::default(), date(2015, 12, 31), date(2016, 12, 31))]
    #[case::into_leap_year(FiscalYearEnd::new(2, 28), date(2023, 2, 28), date(2024, 2, 29))]
    #[case::out_of_leap_year(FiscalYearEnd::new(2, 28), date(2024, 2, 29), date(2025, 2, 28))]
    #[case::explicit_date_off_year_end(FiscalYearEnd::default(), date(2021, 6, 30), date(2022, 6, 30))]
    fn test_next_period_date_yearly(
        #[case] fiscal_year_end: FiscalYearEnd,
        #[case] from: NaiveDate,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(
            next_period_date(from, MethodPeriod::Yearly, fiscal_year_end).unwrap(),
            expected
        );
    }

    #[test]
    fn test_first_depreciation_date_yearly_uses_fiscal_year_end() {
        let calendar = FiscalYearEnd::default();
        assert_eq!(
            first_depreciation_date(date(2015, 1, 1), MethodPeriod::Yearly, calendar).unwrap(),
            date(2015, 12, 31)
        );

        let june = FiscalYearEnd::new(6, 30);
        assert_eq!(
            first_depreciation_date(date(2021, 7, 1), MethodPeriod::Yearly, june).unwrap(),
            date(2022, 6, 30)
        );
        assert_eq!(
            first_depreciation_date(date(2021, 6, 30), MethodPeriod::Yearly, june).unwrap(),
            date(2021, 6, 30)
        );
    }

    #[test]
    fn test_fiscal_year_end_clamps_leap_day() {
        let feb = FiscalYearEnd::new(2, 29);
        assert_eq!(feb.in_year(2023).unwrap(), date(2023, 2, 28));
        assert_eq!(feb.in_year(2024).unwrap(), date(2024, 2, 29));

        let feb = FiscalYearEnd::new(2, 28);
        assert_eq!(feb.in_year(2023).unwrap(), date(2023, 2, 28));
        assert_eq!(feb.in_year(2024).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_invalid_fiscal_year_end() {
        assert!(FiscalYearEnd::new(13, 1).in_year(2021).is_err());
        assert!(FiscalYearEnd::new(5, 0).in_year(2021).is_err());
    }

    #[test]
    fn test_prorata_factor_monthly() {
        let factor = prorata_factor(date(2021, 1, 16), date(2021, 1, 31), MethodPeriod::Monthly).unwrap();
        assert_eq!(factor, Decimal::from(16) / Decimal::from(31));
    }

    #[test]
    fn test_prorata_factor_yearly() {
        let factor = prorata_factor(date(2021, 7, 1), date(2021, 12, 31), MethodPeriod::Yearly).unwrap();
        assert_eq!(factor, Decimal::from(184) / Decimal::from(365));
    }

    #[test]
    fn test_prorata_factor_is_clamped() {
        let full = prorata_factor(date(2020, 1, 1), date(2021, 1, 31), MethodPeriod::Monthly).unwrap();
        assert_eq!(full, dec!(1));
        let none = prorata_factor(date(2021, 2, 5), date(2021, 1, 31), MethodPeriod::Monthly).unwrap();
        assert_eq!(none, dec!(0));
    }
}
