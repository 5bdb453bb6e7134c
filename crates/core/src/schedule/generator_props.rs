//! Property-based tests for the schedule generator.
//!
//! - Schedule completeness: installments sum to the amount to depreciate
//! - The last installment leaves exactly zero
//! - Running totals are monotonic and dates strictly increase

use chrono::NaiveDate;
use deprecia_shared::types::Currency;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::dates::FiscalYearEnd;
use super::generator::ScheduleGenerator;
use super::types::ScheduleParams;
use crate::asset::{DepreciationMethod, MethodPeriod};

/// Strategy to generate positive amounts (0.01 to 10,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate declining factors (0.01 to 1.00).
fn progress_factor() -> impl Strategy<Value = Decimal> {
    (1i64..=100i64).prop_map(|v| Decimal::new(v, 2))
}

/// Strategy to generate depreciation methods.
fn method_strategy() -> impl Strategy<Value = DepreciationMethod> {
    prop_oneof![
        Just(DepreciationMethod::Linear),
        Just(DepreciationMethod::Declining),
        Just(DepreciationMethod::DecliningThenLinear),
    ]
}

/// Strategy to generate period lengths.
fn period_strategy() -> impl Strategy<Value = MethodPeriod> {
    prop_oneof![Just(MethodPeriod::Monthly), Just(MethodPeriod::Yearly)]
}

/// Strategy to generate optional pro-rata factors.
fn prorata_strategy() -> impl Strategy<Value = Option<Decimal>> {
    prop_oneof![
        Just(None),
        (1i64..=31i64).prop_map(|days| Some(Decimal::from(days) / Decimal::from(31))),
    ]
}

#[allow(clippy::too_many_arguments)]
fn make_params(
    method: DepreciationMethod,
    amount: Decimal,
    periods: u32,
    factor: Decimal,
    period: MethodPeriod,
    prorata: Option<Decimal>,
    already: Decimal,
) -> ScheduleParams {
    ScheduleParams {
        method,
        progress_factor: factor,
        method_period: period,
        periods,
        prorata_factor: prorata,
        start_date: NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
        amount_to_depreciate: amount,
        already_depreciated: already,
        currency: Currency::Usd,
        fiscal_year_end: FiscalYearEnd::default(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Installments sum exactly to the amount to depreciate and the last one
    /// leaves a remaining value of exactly zero.
    #[test]
    fn prop_schedule_is_complete(
        method in method_strategy(),
        amount in positive_amount(),
        periods in 1u32..120,
        factor in progress_factor(),
        period in period_strategy(),
        prorata in prorata_strategy(),
    ) {
        let params = make_params(method, amount, periods, factor, period, prorata, Decimal::ZERO);
        let installments = ScheduleGenerator::generate(&params).unwrap();

        let total: Decimal = installments.iter().map(|i| i.amount).sum();
        prop_assert_eq!(total, amount);
        let last = installments.last().unwrap();
        prop_assert_eq!(last.remaining_value, Decimal::ZERO);
        prop_assert_eq!(last.depreciated_value, amount);
        prop_assert!(installments.len() <= params.installment_count() as usize);
    }

    /// Every installment but the last is rounded to the currency precision.
    #[test]
    fn prop_installments_are_rounded(
        method in method_strategy(),
        amount in positive_amount(),
        periods in 1u32..60,
        factor in progress_factor(),
    ) {
        let params = make_params(method, amount, periods, factor, MethodPeriod::Yearly, None, Decimal::ZERO);
        let installments = ScheduleGenerator::generate(&params).unwrap();
        for installment in &installments {
            prop_assert_eq!(installment.amount, Currency::Usd.round(installment.amount));
        }
    }

    /// Remaining values never increase, depreciated values never decrease and
    /// dates strictly increase.
    #[test]
    fn prop_running_totals_are_monotonic(
        method in method_strategy(),
        amount in positive_amount(),
        periods in 1u32..60,
        factor in progress_factor(),
        period in period_strategy(),
        already in positive_amount(),
    ) {
        let params = make_params(method, amount, periods, factor, period, None, already);
        let installments = ScheduleGenerator::generate(&params).unwrap();
        for pair in installments.windows(2) {
            prop_assert!(pair[1].remaining_value <= pair[0].remaining_value);
            prop_assert!(pair[1].depreciated_value >= pair[0].depreciated_value);
            prop_assert!(pair[1].date > pair[0].date);
        }
        prop_assert_eq!(
            installments[0].depreciated_value,
            already + installments[0].amount
        );
    }

    /// Linear installments are equal apart from the pro-rata stub and the last one.
    #[test]
    fn prop_linear_installments_are_equal(
        amount in positive_amount(),
        periods in 3u32..60,
    ) {
        let params = make_params(
            DepreciationMethod::Linear, amount, periods, Decimal::ONE, MethodPeriod::Monthly, None, Decimal::ZERO,
        );
        let installments = ScheduleGenerator::generate(&params).unwrap();
        let expected = Currency::Usd.round(amount / Decimal::from(periods));
        if !expected.is_zero() {
            for installment in &installments[..installments.len() - 1] {
                prop_assert_eq!(installment.amount, expected);
            }
        }
    }
}
