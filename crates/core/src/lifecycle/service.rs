//! Lifecycle rules of assets and their entries.
//!
//! Pure checks; the asset book applies the transitions.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::asset::{Asset, AssetError, AssetState, LifecycleStage};
use crate::ledger::{Move, MoveState, PostingRule};

/// Stateless lifecycle rules.
pub struct LifecycleService;

impl LifecycleService {
    /// Checks the asset is in `expected` state.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidAssetState` otherwise.
    pub fn ensure_state(asset: &Asset, expected: AssetState) -> Result<(), AssetError> {
        if asset.state == expected {
            Ok(())
        } else {
            Err(AssetError::InvalidAssetState {
                asset_id: asset.id,
                expected,
                actual: asset.state,
            })
        }
    }

    /// Checks an asset can be validated and resolves its posting rule.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidAssetState` unless the asset is a draft,
    /// `AssetError::ScheduleAlreadyGenerated` if it already has entries and
    /// `AssetError::MissingDepreciationAccounts` without posting accounts.
    pub fn check_validate(asset: &Asset, existing_entries: usize) -> Result<PostingRule, AssetError> {
        Self::ensure_state(asset, AssetState::Draft)?;
        if existing_entries > 0 {
            return Err(AssetError::ScheduleAlreadyGenerated(asset.id));
        }
        PostingRule::for_asset(asset)
    }

    /// Checks the last entry of a schedule leaves nothing to depreciate.
    ///
    /// An empty schedule passes.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::ScheduleDoesNotClose` if the last remaining value is not zero.
    pub fn check_schedule_closes(asset: &Asset, last_remaining: Option<Decimal>) -> Result<(), AssetError> {
        match last_remaining {
            Some(remaining) if !remaining.is_zero() => Err(AssetError::ScheduleDoesNotClose {
                asset_id: asset.id,
                remaining,
            }),
            _ => Ok(()),
        }
    }

    /// Checks an entry can be posted on `today`.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MoveNotDraft` for non-draft entries,
    /// `AssetError::FutureAutoPost` for scheduled entries dated after `today`
    /// and `AssetError::UnbalancedMove` when the lines do not balance.
    pub fn check_postable(entry: &Move, today: NaiveDate) -> Result<(), AssetError> {
        if entry.state != MoveState::Draft {
            return Err(AssetError::MoveNotDraft(entry.id));
        }
        if entry.auto_post && entry.date > today {
            return Err(AssetError::FutureAutoPost {
                move_id: entry.id,
                date: entry.date,
            });
        }
        let negative_side = entry
            .lines
            .iter()
            .any(|l| l.debit < Decimal::ZERO || l.credit < Decimal::ZERO);
        if negative_side || !entry.is_balanced() {
            return Err(AssetError::UnbalancedMove {
                debit: entry.total_debit(),
                credit: entry.total_credit(),
            });
        }
        Ok(())
    }

    /// Checks no posted, unreversed entry is dated after the disposal date.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::PostedEntriesAfterDisposal` otherwise.
    pub fn check_disposal_date<'a>(
        asset: &Asset,
        posted_entries: impl IntoIterator<Item = &'a Move>,
        disposal_date: NaiveDate,
    ) -> Result<(), AssetError> {
        Self::ensure_state(asset, AssetState::Open)?;
        if posted_entries.into_iter().any(|m| m.date > disposal_date) {
            return Err(AssetError::PostedEntriesAfterDisposal {
                asset_id: asset.id,
                disposal_date,
            });
        }
        Ok(())
    }

    /// Checks an asset can be deleted.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::CannotDeleteAsset` unless the asset is a draft or a
    /// model and `AssetError::AssetHasPostedEntries` if anything is posted.
    pub fn check_deletable(asset: &Asset, has_posted_entries: bool) -> Result<(), AssetError> {
        if !matches!(asset.state, AssetState::Draft | AssetState::Model) {
            return Err(AssetError::CannotDeleteAsset {
                asset_id: asset.id,
                state: asset.state,
            });
        }
        if has_posted_entries {
            return Err(AssetError::AssetHasPostedEntries(asset.id));
        }
        Ok(())
    }

    /// Returns true if posting left an automatically closing asset fully recognised.
    ///
    /// `entries` are the asset's entries ordered by date.
    #[must_use]
    pub fn should_auto_close(asset: &Asset, entries: &[&Move]) -> bool {
        if asset.state != AssetState::Open || !asset.asset_type.closes_automatically() {
            return false;
        }
        let live: Vec<&&Move> = entries.iter().filter(|m| m.state != MoveState::Cancel).collect();
        live.iter().all(|m| m.is_posted())
            && live.last().is_some_and(|m| m.asset_remaining_value.is_zero())
    }

    /// Derives the lifecycle stage of an asset.
    #[must_use]
    pub fn stage(asset: &Asset, has_draft_entries: bool) -> LifecycleStage {
        match asset.state {
            AssetState::Model | AssetState::Draft => LifecycleStage::Draft,
            AssetState::Open if has_draft_entries => LifecycleStage::Open,
            AssetState::Open => LifecycleStage::Running,
            AssetState::Close => LifecycleStage::Close,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetAccounts, AssetType, DepreciationTerms};
    use crate::ledger::{MoveKind, MoveLineInput, MoveType};
    use deprecia_shared::types::{AccountId, AssetId, CompanyId, Currency, MoveId, MoveLineId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_asset(asset_type: AssetType, state: AssetState) -> Asset {
        Asset {
            id: AssetId::from_raw(1),
            name: "Office rent".to_string(),
            asset_type,
            state,
            active: true,
            company_id: CompanyId::new(),
            currency: Currency::Usd,
            journal_id: None,
            original_value: dec!(1200),
            salvage_value: Decimal::ZERO,
            already_depreciated_amount_import: Decimal::ZERO,
            depreciation_number_import: 0,
            first_depreciation_date_import: None,
            acquisition_date: date(2021, 1, 1),
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

    fn make_move(id: u64, state: MoveState, date: NaiveDate, remaining: Decimal) -> Move {
        let account = AccountId::new();
        let lines = vec![
            MoveLineInput::from_balance(account, None, dec!(100), dec!(100), Currency::Usd),
            MoveLineInput::from_balance(account, None, dec!(-100), dec!(-100), Currency::Usd),
        ];
        Move {
            id: MoveId::from_raw(id),
            kind: MoveKind::Depreciation,
            move_type: MoveType::Entry,
            state,
            date,
            reference: String::new(),
            company_id: CompanyId::new(),
            journal_id: None,
            currency: Currency::Usd,
            partner_id: None,
            asset_id: Some(AssetId::from_raw(1)),
            amount_total: dec!(100),
            asset_remaining_value: remaining,
            asset_depreciated_value: Decimal::ZERO,
            auto_post: true,
            reversed_entry_id: None,
            lines: lines
                .into_iter()
                .enumerate()
                .map(|(i, l)| l.into_line(MoveLineId::from_raw(id * 10 + i as u64), MoveId::from_raw(id)))
                .collect(),
        }
    }

    #[test]
    fn test_validate_twice_is_refused() {
        let asset = make_asset(AssetType::Purchase, AssetState::Draft);
        assert!(LifecycleService::check_validate(&asset, 0).is_ok());
        assert!(matches!(
            LifecycleService::check_validate(&asset, 5),
            Err(AssetError::ScheduleAlreadyGenerated(_))
        ));

        let open = make_asset(AssetType::Purchase, AssetState::Open);
        assert!(matches!(
            LifecycleService::check_validate(&open, 0),
            Err(AssetError::InvalidAssetState { .. })
        ));
    }

    #[test]
    fn test_schedule_must_close() {
        let asset = make_asset(AssetType::Purchase, AssetState::Draft);
        assert!(LifecycleService::check_schedule_closes(&asset, None).is_ok());
        assert!(LifecycleService::check_schedule_closes(&asset, Some(dec!(0.00))).is_ok());
        assert!(matches!(
            LifecycleService::check_schedule_closes(&asset, Some(dec!(0.01))),
            Err(AssetError::ScheduleDoesNotClose { .. })
        ));
    }

    #[test]
    fn test_future_auto_post_is_refused() {
        let entry = make_move(1, MoveState::Draft, date(2021, 12, 31), dec!(0));
        assert!(LifecycleService::check_postable(&entry, date(2021, 12, 31)).is_ok());
        assert!(matches!(
            LifecycleService::check_postable(&entry, date(2021, 6, 30)),
            Err(AssetError::FutureAutoPost { .. })
        ));

        let manual = Move {
            auto_post: false,
            ..entry
        };
        assert!(LifecycleService::check_postable(&manual, date(2021, 6, 30)).is_ok());
    }

    #[test]
    fn test_posted_entry_cannot_be_posted_again() {
        let entry = make_move(1, MoveState::Posted, date(2021, 1, 31), dec!(0));
        assert!(matches!(
            LifecycleService::check_postable(&entry, date(2022, 1, 1)),
            Err(AssetError::MoveNotDraft(_))
        ));
    }

    #[test]
    fn test_disposal_after_posted_entries_is_refused() {
        let asset = make_asset(AssetType::Purchase, AssetState::Open);
        let posted = make_move(1, MoveState::Posted, date(2021, 12, 31), dec!(600));
        assert!(LifecycleService::check_disposal_date(&asset, [&posted], date(2021, 12, 31)).is_ok());
        assert!(matches!(
            LifecycleService::check_disposal_date(&asset, [&posted], date(2021, 6, 30)),
            Err(AssetError::PostedEntriesAfterDisposal { .. })
        ));
    }

    #[rstest]
    #[case(AssetType::Expense, true)]
    #[case(AssetType::Sale, true)]
    #[case(AssetType::Purchase, false)]
    fn test_auto_close_only_deferred_types(#[case] asset_type: AssetType, #[case] expected: bool) {
        let asset = make_asset(asset_type, AssetState::Open);
        let first = make_move(1, MoveState::Posted, date(2021, 1, 31), dec!(600));
        let last = make_move(2, MoveState::Posted, date(2021, 2, 28), dec!(0));
        assert_eq!(LifecycleService::should_auto_close(&asset, &[&first, &last]), expected);
    }

    #[test]
    fn test_no_auto_close_with_drafts_left() {
        let asset = make_asset(AssetType::Expense, AssetState::Open);
        let first = make_move(1, MoveState::Posted, date(2021, 1, 31), dec!(600));
        let last = make_move(2, MoveState::Draft, date(2021, 2, 28), dec!(0));
        assert!(!LifecycleService::should_auto_close(&asset, &[&first, &last]));
    }

    #[rstest]
    #[case(AssetState::Draft, false, LifecycleStage::Draft)]
    #[case(AssetState::Model, false, LifecycleStage::Draft)]
    #[case(AssetState::Open, true, LifecycleStage::Open)]
    #[case(AssetState::Open, false, LifecycleStage::Running)]
    #[case(AssetState::Close, false, LifecycleStage::Close)]
    fn test_stage(#[case] state: AssetState, #[case] drafts: bool, #[case] expected: LifecycleStage) {
        let asset = make_asset(AssetType::Purchase, state);
        assert_eq!(LifecycleService::stage(&asset, drafts), expected);
    }

    #[test]
    fn test_deletable() {
        let draft = make_asset(AssetType::Purchase, AssetState::Draft);
        assert!(LifecycleService::check_deletable(&draft, false).is_ok());
        assert!(matches!(
            LifecycleService::check_deletable(&draft, true),
            Err(AssetError::AssetHasPostedEntries(_))
        ));
        let open = make_asset(AssetType::Purchase, AssetState::Open);
        assert!(matches!(
            LifecycleService::check_deletable(&open, false),
            Err(AssetError::CannotDeleteAsset { .. })
        ));
    }
}
