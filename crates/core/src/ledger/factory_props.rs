//! Property-based tests for the entry factory.
//!
//! - Every depreciation entry balances, whatever the rate or sign
//! - Every disposal entry balances
//! - A reversal cancels the original lines account by account

use std::collections::BTreeMap;

use chrono::NaiveDate;
use deprecia_shared::types::{AccountId, AssetId, CompanyId, Currency, MoveId, MoveLineId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::entry::{Move, MoveKind, MoveState, MoveType};
use super::factory::{DisposalValues, EntryFactory, PostingContext};
use super::validation::validate_lines;
use crate::asset::{Asset, AssetAccounts, AssetState, AssetType, DepreciationTerms};

/// Strategy to generate signed amounts (-1,000,000.00 to 1,000,000.00).
fn signed_amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate non-negative amounts.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate exchange rates (0.0001 to 100).
fn rate() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn asset_type() -> impl Strategy<Value = AssetType> {
    prop_oneof![
        Just(AssetType::Purchase),
        Just(AssetType::Sale),
        Just(AssetType::Expense),
    ]
}

fn make_asset(asset_type: AssetType, original_value: Decimal) -> Asset {
    Asset {
        id: AssetId::from_raw(1),
        name: "Asset".to_string(),
        asset_type,
        state: AssetState::Open,
        active: true,
        company_id: CompanyId::new(),
        currency: Currency::Eur,
        journal_id: None,
        original_value,
        salvage_value: Decimal::ZERO,
        already_depreciated_amount_import: Decimal::ZERO,
        depreciation_number_import: 0,
        first_depreciation_date_import: None,
        acquisition_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        first_depreciation_date: None,
        disposal_date: None,
        terms: DepreciationTerms::default(),
        accounts: AssetAccounts {
            asset: Some(AccountId::new()),
            depreciation: Some(AccountId::new()),
            depreciation_expense: Some(AccountId::new()),
        },
        parent_id: None,
        model_id: None,
        original_move_line_ids: Vec::new(),
    }
}

fn make_context(rate: Decimal, refund_origin: bool) -> PostingContext {
    PostingContext {
        rate,
        refund_origin,
        ..PostingContext::same_currency(Currency::Usd)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Depreciation entries have exactly two lines that balance.
    #[test]
    fn prop_depreciation_lines_balance(
        asset_type in asset_type(),
        amount in signed_amount(),
        rate in rate(),
        refund_origin in any::<bool>(),
    ) {
        let asset = make_asset(asset_type, Decimal::from(1000));
        let ctx = make_context(rate, refund_origin);
        let lines = EntryFactory::depreciation_lines(&asset, amount, ctx.to_company(amount), &ctx).unwrap();
        prop_assert_eq!(lines.len(), 2);
        prop_assert!(validate_lines(&lines).is_ok());
    }

    /// Disposal entries balance for any combination of depreciation and proceeds.
    #[test]
    fn prop_disposal_lines_balance(
        asset_type in asset_type(),
        original in amount(),
        depreciated in amount(),
        proceeds in proptest::collection::vec(amount(), 0..3),
        rate in rate(),
    ) {
        let asset = make_asset(asset_type, original);
        let values = DisposalValues {
            asset_account: asset.accounts.asset.unwrap(),
            depreciated,
            proceeds: proceeds.into_iter().map(|p| (AccountId::new(), p)).collect(),
            gain_account: Some(AccountId::new()),
            loss_account: Some(AccountId::new()),
        };
        let lines = EntryFactory::disposal_lines(&asset, &values, &make_context(rate, false)).unwrap();
        prop_assert!(validate_lines(&lines).is_ok());
    }

    /// Posting an entry and its reversal leaves every account at zero.
    #[test]
    fn prop_reversal_cancels_original(
        asset_type in asset_type(),
        amount in signed_amount(),
    ) {
        let asset = make_asset(asset_type, Decimal::from(1000));
        let ctx = make_context(Decimal::ONE, false);
        let input = EntryFactory::depreciation_lines(&asset, amount, amount, &ctx).unwrap();
        let date = NaiveDate::from_ymd_opt(2021, 12, 31).unwrap();

        let original = Move {
            id: MoveId::from_raw(1),
            kind: MoveKind::Depreciation,
            move_type: MoveType::Entry,
            state: MoveState::Posted,
            date,
            reference: String::new(),
            company_id: asset.company_id,
            journal_id: None,
            currency: asset.currency,
            partner_id: None,
            asset_id: Some(asset.id),
            amount_total: amount,
            asset_remaining_value: Decimal::ZERO,
            asset_depreciated_value: amount,
            auto_post: false,
            reversed_entry_id: None,
            lines: input
                .into_iter()
                .enumerate()
                .map(|(i, l)| l.into_line(MoveLineId::from_raw(i as u64 + 1), MoveId::from_raw(1)))
                .collect(),
        };
        let reversal = EntryFactory::reversal_move(&original, date);
        let mut mirrored = original.clone();
        mirrored.id = MoveId::from_raw(2);
        for (line, input) in mirrored.lines.iter_mut().zip(&reversal.lines) {
            line.debit = input.debit;
            line.credit = input.credit;
        }

        let mut net: BTreeMap<_, Decimal> = BTreeMap::new();
        for line in original.lines.iter().chain(&mirrored.lines) {
            *net.entry(line.account_id.into_inner()).or_default() += line.debit - line.credit;
        }
        for balance in net.into_values() {
            prop_assert_eq!(balance, Decimal::ZERO);
        }
    }
}
