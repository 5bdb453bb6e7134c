//! Property-based tests for the asset book.
//!
//! - Stored running totals always agree with a re-threading of the board
//! - A validated board depreciates exactly the opening residual
//! - Reversing a posted entry keeps the board closing at zero
//! - A failed operation leaves the book untouched

use chrono::{Days, NaiveDate};
use deprecia_shared::types::{AssetId, Currency};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::{Account, AccountKind, AssetBook, Company};
use crate::asset::{AssetType, CreateAssetInput, DepreciationMethod, DepreciationTerms, MethodPeriod};
use crate::reversal::ReversalService;

/// Strategy for original values (100.00 to 1,000,000.00).
fn original_value() -> impl Strategy<Value = Decimal> {
    (10_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn method() -> impl Strategy<Value = DepreciationMethod> {
    prop_oneof![
        Just(DepreciationMethod::Linear),
        Just(DepreciationMethod::Declining),
        Just(DepreciationMethod::DecliningThenLinear),
    ]
}

fn period() -> impl Strategy<Value = MethodPeriod> {
    prop_oneof![Just(MethodPeriod::Monthly), Just(MethodPeriod::Yearly)]
}

/// Opens an asset acquired on 2020-01-01 in a book whose today is `days` later.
fn make_book(
    value: Decimal,
    salvage_pct: u32,
    terms: DepreciationTerms,
    days: u64,
) -> (AssetBook, AssetId) {
    let acquisition = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut book = AssetBook::new();
    book.set_today(Some(acquisition + Days::new(days)));

    let company = Company::new("YourCompany", Currency::Usd);
    let company_id = book.add_company(company);
    let depreciation = book.add_account(Account::new(
        "151100",
        "Accumulated Depreciation",
        company_id,
        AccountKind::FixedAsset,
    ));
    let expense = book.add_account(Account::new(
        "620000",
        "Depreciation Expense",
        company_id,
        AccountKind::Expense,
    ));

    let mut input = CreateAssetInput::new("Truck", AssetType::Purchase, company_id, value, acquisition);
    input.salvage_value = Currency::Usd.round(value * Decimal::from(salvage_pct) / Decimal::ONE_HUNDRED);
    input.terms = terms;
    input.accounts.depreciation = Some(depreciation);
    input.accounts.depreciation_expense = Some(expense);
    let id = book.create_asset(input).unwrap();
    book.validate(id).unwrap();
    (book, id)
}

fn assert_consistent(book: &AssetBook, id: AssetId) -> Result<(), TestCaseError> {
    let asset = book.asset(id).unwrap();
    let board = book.board(id);
    let expected = ReversalService::rethread(asset.opening_residual(), &board);
    for (entry, totals) in board.iter().zip(&expected) {
        prop_assert_eq!(entry.remaining_value, totals.remaining_value);
        prop_assert_eq!(entry.depreciated_value, totals.depreciated_value);
    }

    let counted: Decimal = board.iter().filter(|e| !e.reversed).map(|e| e.amount).sum();
    prop_assert_eq!(counted, asset.opening_residual());
    if let Some(last) = board.last() {
        prop_assert_eq!(last.remaining_value, Decimal::ZERO);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A validated board is consistent and depreciates the whole residual.
    #[test]
    fn prop_validated_board_closes(
        value in original_value(),
        salvage_pct in 0u32..50,
        method in method(),
        method_period in period(),
        method_number in 1u32..12,
        prorata in any::<bool>(),
        days in 0u64..4000,
    ) {
        let terms = DepreciationTerms {
            method,
            method_number,
            method_period,
            prorata,
            ..DepreciationTerms::default()
        };
        let (book, id) = make_book(value, salvage_pct, terms, days);
        assert_consistent(&book, id)?;
        let today = book.today();
        for entry in book.asset_entries(id) {
            prop_assert_eq!(entry.is_posted(), entry.date <= today);
        }
    }

    /// Reversing any posted entry keeps the board consistent.
    #[test]
    fn prop_reversal_keeps_board_closing(
        value in original_value(),
        salvage_pct in 0u32..50,
        method_number in 2u32..8,
        days in 400u64..3000,
        pick in any::<usize>(),
    ) {
        let terms = DepreciationTerms {
            method_number,
            ..DepreciationTerms::default()
        };
        let (mut book, id) = make_book(value, salvage_pct, terms, days);
        let posted: Vec<_> = book.posted_entries(id).iter().map(|m| (m.id, m.date)).collect();
        prop_assume!(!posted.is_empty());

        let (move_id, date) = posted[pick % posted.len()];
        book.reverse_move(move_id, date).unwrap();
        assert_consistent(&book, id)?;
        prop_assert!(book.is_reversed(move_id));
    }

    /// Operations that fail leave no trace.
    #[test]
    fn prop_failed_operations_roll_back(
        value in original_value(),
        salvage_pct in 0u32..50,
        method_number in 2u32..8,
        days in 400u64..3000,
    ) {
        let terms = DepreciationTerms {
            method_number,
            ..DepreciationTerms::default()
        };
        let (mut book, id) = make_book(value, salvage_pct, terms, days);
        let snapshot = book.clone();

        prop_assert!(book.validate(id).is_err());
        prop_assert_eq!(&book, &snapshot);

        let first_posted = book.posted_entries(id).first().map(|m| (m.id, m.date));
        if let Some((move_id, date)) = first_posted {
            let before = date.pred_opt().unwrap();
            prop_assert!(book.set_to_close(id, &[], before).is_err());
            prop_assert_eq!(&book, &snapshot);

            prop_assert!(book.edit_draft_amounts(id, &[(move_id, Decimal::ONE)]).is_err());
            prop_assert_eq!(&book, &snapshot);
        }
    }
}
