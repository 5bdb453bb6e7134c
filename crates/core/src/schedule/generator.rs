//! Depreciation schedule generator.

use rust_decimal::Decimal;

use super::dates::next_period_date;
use super::error::ScheduleError;
use super::types::{Installment, ScheduleParams};
use crate::asset::DepreciationMethod;

/// Stateless generator turning depreciation terms into installments.
pub struct ScheduleGenerator;

impl ScheduleGenerator {
    /// Generates the installments of a schedule.
    ///
    /// Every installment but the last is rounded to the currency precision; the
    /// last one takes whatever residual is left so the installments sum exactly
    /// to `amount_to_depreciate`. Installments rounding to zero are skipped, the
    /// schedule still advances one period.
    ///
    /// # Arguments
    ///
    /// * `params` - Terms, amounts and dates of the schedule
    ///
    /// # Returns
    ///
    /// The ordered installments; empty when there is nothing left to depreciate
    /// or no period left to depreciate it in.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::DateOutOfRange` if a date overflows the calendar.
    pub fn generate(params: &ScheduleParams) -> Result<Vec<Installment>, ScheduleError> {
        let currency = params.currency;
        let total = currency.round(params.amount_to_depreciate);
        let count = params.installment_count();
        if count == 0 || total.is_zero() {
            return Ok(Vec::new());
        }

        // Work on magnitudes so refunds follow the same rounding as ordinary assets.
        let sign = if total.is_sign_negative() {
            Decimal::NEGATIVE_ONE
        } else {
            Decimal::ONE
        };
        let base = total.abs();
        let has_stub = params.prorata_factor.is_some();

        let mut residual = base;
        let mut date = params.start_date;
        let mut installments = Vec::with_capacity(count as usize);

        for sequence in 1..=count {
            let mut amount = if sequence == count {
                residual
            } else {
                Self::period_amount(params, base, residual, count - sequence + 1)
            };
            let prorata = has_stub && sequence == 1;
            if prorata {
                amount *= params.prorata_factor.unwrap_or(Decimal::ONE);
            }
            let amount = currency.round(amount);

            if !amount.is_zero() {
                residual -= amount;
                installments.push(Installment {
                    sequence,
                    number: if has_stub { sequence - 1 } else { sequence },
                    date,
                    amount: amount * sign,
                    depreciated_value: params.already_depreciated + (base - residual) * sign,
                    remaining_value: residual * sign,
                    prorata,
                });
            }
            date = next_period_date(date, params.method_period, params.fiscal_year_end)?;
        }

        Ok(installments)
    }

    /// Unrounded amount of a non-final installment.
    fn period_amount(
        params: &ScheduleParams,
        base: Decimal,
        residual: Decimal,
        periods_left: u32,
    ) -> Decimal {
        let declining = residual * params.progress_factor;
        match params.method {
            DepreciationMethod::Linear => (base / Decimal::from(params.periods)).min(residual),
            DepreciationMethod::Declining => declining,
            DepreciationMethod::DecliningThenLinear => {
                declining.max(residual / Decimal::from(periods_left))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use deprecia_shared::types::Currency;
    use rust_decimal_macros::dec;

    use crate::asset::MethodPeriod;
    use crate::schedule::FiscalYearEnd;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_params(method: DepreciationMethod, amount: Decimal, periods: u32) -> ScheduleParams {
        ScheduleParams {
            method,
            progress_factor: dec!(0.3),
            method_period: MethodPeriod::Yearly,
            periods,
            prorata_factor: None,
            start_date: date(2021, 12, 31),
            amount_to_depreciate: amount,
            already_depreciated: Decimal::ZERO,
            currency: Currency::Usd,
            fiscal_year_end: FiscalYearEnd::default(),
        }
    }

    #[test]
    fn test_linear_five_years() {
        let installments =
            ScheduleGenerator::generate(&make_params(DepreciationMethod::Linear, dec!(10000), 5)).unwrap();

        let amounts: Vec<Decimal> = installments.iter().map(|i| i.amount).collect();
        assert_eq!(amounts, vec![dec!(2000); 5]);
        let remaining: Vec<Decimal> = installments.iter().map(|i| i.remaining_value).collect();
        assert_eq!(
            remaining,
            vec![dec!(8000), dec!(6000), dec!(4000), dec!(2000), dec!(0)]
        );
        let depreciated: Vec<Decimal> = installments.iter().map(|i| i.depreciated_value).collect();
        assert_eq!(
            depreciated,
            vec![dec!(2000), dec!(4000), dec!(6000), dec!(8000), dec!(10000)]
        );
        assert_eq!(installments[0].date, date(2021, 12, 31));
        assert_eq!(installments[4].date, date(2025, 12, 31));
    }

    #[test]
    fn test_last_installment_absorbs_rounding() {
        let installments =
            ScheduleGenerator::generate(&make_params(DepreciationMethod::Linear, dec!(10000), 3)).unwrap();
        let amounts: Vec<Decimal> = installments.iter().map(|i| i.amount).collect();
        assert_eq!(amounts, vec![dec!(3333.33), dec!(3333.33), dec!(3333.34)]);
        assert_eq!(installments[2].remaining_value, dec!(0));
    }

    #[test]
    fn test_declining() {
        let installments =
            ScheduleGenerator::generate(&make_params(DepreciationMethod::Declining, dec!(1000), 3)).unwrap();
        let amounts: Vec<Decimal> = installments.iter().map(|i| i.amount).collect();
        // 1000 * 0.3 = 300, 700 * 0.3 = 210, last takes 490
        assert_eq!(amounts, vec![dec!(300), dec!(210), dec!(490)]);
    }

    #[test]
    fn test_declining_then_linear_switches_per_period() {
        let installments = ScheduleGenerator::generate(&make_params(
            DepreciationMethod::DecliningThenLinear,
            dec!(1000),
            5,
        ))
        .unwrap();
        let amounts: Vec<Decimal> = installments.iter().map(|i| i.amount).collect();
        // 300 (declining 300 > 200), 210 (210 > 175), 163.33 (147 < 490/3),
        // 163.34 (326.67 / 2 rounds half to even), last takes the rest.
        assert_eq!(
            amounts,
            vec![dec!(300), dec!(210), dec!(163.33), dec!(163.34), dec!(163.33)]
        );
        let total: Decimal = amounts.iter().sum();
        assert_eq!(total, dec!(1000));
    }

    #[test]
    fn test_prorata_stub_adds_one_installment() {
        let mut params = make_params(DepreciationMethod::Linear, dec!(1200), 12);
        params.method_period = MethodPeriod::Monthly;
        params.start_date = date(2021, 1, 31);
        params.prorata_factor = Some(Decimal::from(16) / Decimal::from(31));

        let installments = ScheduleGenerator::generate(&params).unwrap();
        assert_eq!(installments.len(), 13);
        assert!(installments[0].prorata);
        assert_eq!(installments[0].number, 0);
        assert_eq!(installments[0].amount, dec!(51.61));
        assert!(installments[1..12].iter().all(|i| i.amount == dec!(100)));
        assert_eq!(installments[12].amount, dec!(48.39));
        assert_eq!(installments[12].date, date(2022, 1, 31));
        assert_eq!(installments[12].remaining_value, dec!(0));
    }

    #[test]
    fn test_already_depreciated_offsets_running_totals() {
        let mut params = make_params(DepreciationMethod::Linear, dec!(3000), 4);
        params.already_depreciated = dec!(4500);
        let installments = ScheduleGenerator::generate(&params).unwrap();
        assert_eq!(installments[0].depreciated_value, dec!(5250));
        assert_eq!(installments[3].depreciated_value, dec!(7500));
    }

    #[test]
    fn test_nothing_to_generate() {
        assert!(
            ScheduleGenerator::generate(&make_params(DepreciationMethod::Linear, dec!(0), 5))
                .unwrap()
                .is_empty()
        );
        assert!(
            ScheduleGenerator::generate(&make_params(DepreciationMethod::Linear, dec!(500), 0))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_negative_amounts_mirror_positive_schedule() {
        let installments =
            ScheduleGenerator::generate(&make_params(DepreciationMethod::Linear, dec!(-1000), 3)).unwrap();
        let amounts: Vec<Decimal> = installments.iter().map(|i| i.amount).collect();
        assert_eq!(amounts, vec![dec!(-333.33), dec!(-333.33), dec!(-333.34)]);
        assert_eq!(installments[2].remaining_value, dec!(0));
    }

    #[test]
    fn test_jpy_rounds_to_whole_units() {
        let mut params = make_params(DepreciationMethod::Linear, dec!(1000), 3);
        params.currency = Currency::Jpy;
        let installments = ScheduleGenerator::generate(&params).unwrap();
        let amounts: Vec<Decimal> = installments.iter().map(|i| i.amount).collect();
        assert_eq!(amounts, vec![dec!(333), dec!(333), dec!(334)]);
    }
}
