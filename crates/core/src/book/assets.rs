//! Asset records: creation, models, creation from journal items and deletion.

use deprecia_shared::types::{AssetId, MoveId, MoveLineId};
use rust_decimal::Decimal;
use tracing::info;

use super::store::AssetBook;
use crate::asset::{AssetError, AssetState, AssetType, CreateAssetInput};
use crate::ledger::{MoveInput, MoveState};
use crate::lifecycle::LifecycleService;

impl AssetBook {
    /// Creates a draft asset.
    ///
    /// The currency defaults to the company currency. When `model_id` is set the
    /// model's terms, accounts and journal are applied.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::CompanyNotFound` for an unknown company and the
    /// errors of [`Self::apply_model`].
    pub fn create_asset(&mut self, input: CreateAssetInput) -> Result<AssetId, AssetError> {
        self.transaction(|book| book.insert_draft_asset(input))
    }

    /// Creates an asset model.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::CompanyNotFound` for an unknown company.
    pub fn create_model(&mut self, input: CreateAssetInput) -> Result<AssetId, AssetError> {
        let id = self.insert_asset(
            CreateAssetInput {
                model_id: None,
                original_move_line_ids: Vec::new(),
                ..input
            },
            AssetState::Model,
            None,
        )?;
        info!(asset_id = %id, "Asset model created");
        Ok(id)
    }

    /// Copies a model's terms, journal and accounts onto a draft asset.
    ///
    /// Accounts already set on the asset are kept.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidAssetState` if `model_id` is not a model or
    /// the asset is not a draft, and `AssetError::IncompleteModel` if the model
    /// has no depreciation or expense account.
    pub fn apply_model(&mut self, asset_id: AssetId, model_id: AssetId) -> Result<(), AssetError> {
        self.transaction(|book| book.apply_model_to(asset_id, model_id))
    }

    /// Turns posted journal items of one account into a draft asset.
    ///
    /// With `deferred` the asset is a deferred expense for a debit balance and
    /// a deferred revenue for a credit balance; otherwise the type follows the
    /// account.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidSourceLines` for no lines, unposted lines or
    /// lines on more than one account.
    pub fn create_from_move_lines(
        &mut self,
        line_ids: &[MoveLineId],
        deferred: bool,
    ) -> Result<AssetId, AssetError> {
        self.transaction(|book| {
            let input = book.input_from_lines(line_ids, deferred)?;
            book.insert_draft_asset(input)
        })
    }

    /// Deletes a draft asset or a model.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::CannotDeleteAsset` for assets past draft and
    /// `AssetError::AssetHasPostedEntries` if any entry is posted.
    pub fn unlink_asset(&mut self, asset_id: AssetId) -> Result<(), AssetError> {
        self.transaction(|book| {
            let asset = book.asset(asset_id)?;
            let has_posted = book.asset_entries(asset_id).iter().any(|m| m.is_posted());
            LifecycleService::check_deletable(asset, has_posted)?;
            book.remove_asset(asset_id)?;
            info!(asset_id = %asset_id, "Asset deleted");
            Ok(())
        })
    }

    /// Records a draft journal entry, typically a vendor bill or a credit note.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::UnbalancedMove` if the lines do not balance and
    /// `AssetError::CompanyNotFound` for an unknown company.
    pub fn create_move(&mut self, input: MoveInput) -> Result<MoveId, AssetError> {
        self.transaction(|book| book.insert_move(input, MoveState::Draft))
    }

    pub(super) fn insert_draft_asset(&mut self, input: CreateAssetInput) -> Result<AssetId, AssetError> {
        let model_id = input.model_id;
        let id = self.insert_asset(input, AssetState::Draft, None)?;
        if let Some(model_id) = model_id {
            self.apply_model_to(id, model_id)?;
        }
        info!(asset_id = %id, model_id = ?model_id, "Asset created");
        Ok(id)
    }

    fn apply_model_to(&mut self, asset_id: AssetId, model_id: AssetId) -> Result<(), AssetError> {
        let model = self.asset(model_id)?.clone();
        LifecycleService::ensure_state(&model, AssetState::Model)?;
        if model.accounts.depreciation.is_none() || model.accounts.depreciation_expense.is_none() {
            return Err(AssetError::IncompleteModel {
                model_id,
                reason: "depreciation and expense accounts are required".to_string(),
            });
        }

        let asset = self.asset_mut(asset_id)?;
        LifecycleService::ensure_state(asset, AssetState::Draft)?;
        asset.terms = model.terms;
        asset.journal_id = model.journal_id.or(asset.journal_id);
        asset.accounts.asset = asset.accounts.asset.or(model.accounts.asset);
        asset.accounts.depreciation = model.accounts.depreciation;
        asset.accounts.depreciation_expense = model.accounts.depreciation_expense;
        asset.model_id = Some(model_id);
        Ok(())
    }

    fn input_from_lines(&self, line_ids: &[MoveLineId], deferred: bool) -> Result<CreateAssetInput, AssetError> {
        let Some(first_id) = line_ids.first() else {
            return Err(AssetError::InvalidSourceLines("no journal items selected".to_string()));
        };
        let lines = line_ids
            .iter()
            .map(|id| self.line(*id))
            .collect::<Result<Vec<_>, _>>()?;
        if lines.iter().any(|(m, _)| !m.is_posted()) {
            return Err(AssetError::InvalidSourceLines(
                "all journal items must be posted".to_string(),
            ));
        }
        let (first_move, first_line) = self.line(*first_id)?;
        if lines.iter().any(|(_, l)| l.account_id != first_line.account_id) {
            return Err(AssetError::InvalidSourceLines(
                "all journal items must share the same account".to_string(),
            ));
        }

        let account = self.account(first_line.account_id)?;
        let balance: Decimal = lines.iter().map(|(_, l)| l.balance()).sum();
        let asset_type = if deferred {
            if balance > Decimal::ZERO {
                AssetType::Expense
            } else {
                AssetType::Sale
            }
        } else {
            account.kind.default_asset_type().unwrap_or(AssetType::Purchase)
        };
        let acquisition_date = lines
            .iter()
            .map(|(m, _)| m.date)
            .min()
            .unwrap_or(first_move.date);
        let name = first_line
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| account.name.clone());

        let mut input = CreateAssetInput::new(
            name,
            asset_type,
            first_move.company_id,
            balance.abs(),
            acquisition_date,
        );
        input.accounts.asset = Some(account.id);
        input.original_move_line_ids = line_ids.to_vec();
        Ok(input)
    }
}
