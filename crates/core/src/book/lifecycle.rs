//! Validation, posting and disposal of assets.

use chrono::NaiveDate;
use deprecia_shared::types::{AssetId, MoveId, MoveLineId};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::store::AssetBook;
use crate::asset::{AssetError, AssetState};
use crate::ledger::{DisposalValues, EntryFactory, Move, MoveInput, MoveKind, MoveState, MoveType};
use crate::lifecycle::LifecycleService;

impl AssetBook {
    /// Validates a draft asset.
    ///
    /// The asset opens, its schedule is generated as auto-posted drafts and
    /// every entry dated today or earlier is posted right away.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidAssetState` unless the asset is a draft,
    /// `AssetError::ScheduleAlreadyGenerated` if it already has entries,
    /// `AssetError::MissingDepreciationAccounts` without posting accounts and
    /// `AssetError::ScheduleDoesNotClose` if the schedule leaves a residual.
    pub fn validate(&mut self, asset_id: AssetId) -> Result<(), AssetError> {
        self.transaction(|book| book.validate_asset(asset_id))
    }

    /// Posts a draft entry.
    ///
    /// Posting a disposal closes its asset. Posting the last entry of a
    /// deferred revenue or expense closes it too. Posting an invoice creates
    /// assets for its lines, and posting a credit note removes the assets of
    /// the lines it credits.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MoveNotDraft` unless the entry is a draft,
    /// `AssetError::FutureAutoPost` for auto-posted entries dated after today
    /// and `AssetError::UnbalancedMove` for unbalanced entries.
    pub fn post_move(&mut self, move_id: MoveId) -> Result<(), AssetError> {
        self.transaction(|book| book.post_entry(move_id))
    }

    /// Posts every auto-posted draft dated today or earlier, by date then ID.
    ///
    /// # Errors
    ///
    /// Fails if any entry cannot be posted; nothing is posted then.
    pub fn post_due_entries(&mut self) -> Result<Vec<MoveId>, AssetError> {
        self.transaction(|book| {
            let today = book.today();
            let mut due: Vec<&Move> = book
                .entries()
                .filter(|m| m.is_draft() && m.auto_post && m.date <= today)
                .collect();
            due.sort_by_key(|m| (m.date, m.id));
            let due: Vec<MoveId> = due.into_iter().map(|m| m.id).collect();

            for move_id in &due {
                // Earlier postings may have removed or posted the entry.
                if book.entry(*move_id).is_ok_and(Move::is_draft) {
                    book.post_entry(*move_id)?;
                }
            }
            info!(count = due.len(), date = %today, "Due entries posted");
            Ok(due)
        })
    }

    /// Prepares the disposal (or, with invoice lines, the sale) of an open asset.
    ///
    /// Draft entries are dropped and a draft disposal entry dated `date` is
    /// booked. Posting it closes the asset.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidAssetState` unless the asset is open,
    /// `AssetError::PostedEntriesAfterDisposal` if entries are posted after
    /// `date` and `AssetError::MissingGainLossAccount` when a gain or loss has
    /// no account.
    pub fn set_to_close(
        &mut self,
        asset_id: AssetId,
        invoice_line_ids: &[MoveLineId],
        date: NaiveDate,
    ) -> Result<MoveId, AssetError> {
        self.transaction(|book| book.dispose(asset_id, invoice_line_ids, date))
    }

    /// Resets a posted or cancelled source entry to draft.
    ///
    /// Draft assets created from it are deleted.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::DepreciationResetNotAllowed` for asset entries and
    /// `AssetError::ProgressedAssetOnReset` if one of its assets is past draft.
    pub fn button_draft(&mut self, move_id: MoveId) -> Result<(), AssetError> {
        self.transaction(|book| {
            let entry = book.entry(move_id)?;
            if entry.asset_id.is_some() {
                return Err(AssetError::DepreciationResetNotAllowed(move_id));
            }
            if entry.is_draft() {
                return Err(AssetError::MoveNotPosted(move_id));
            }

            let linked = book.assets_of_move(move_id);
            for asset_id in &linked {
                let asset = book.asset(*asset_id)?;
                if !asset.is_draft() {
                    return Err(AssetError::ProgressedAssetOnReset {
                        move_id,
                        asset_id: *asset_id,
                    });
                }
            }
            for asset_id in &linked {
                book.remove_asset(*asset_id)?;
            }
            book.entry_mut(move_id)?.state = MoveState::Draft;
            info!(move_id = %move_id, deleted_assets = linked.len(), "Entry reset to draft");
            Ok(())
        })
    }

    /// Cancels a draft entry and archives the assets created from it.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MoveNotDraft` unless the entry is a draft.
    pub fn cancel_move(&mut self, move_id: MoveId) -> Result<(), AssetError> {
        self.transaction(|book| {
            let entry = book.entry_mut(move_id)?;
            if !entry.is_draft() {
                return Err(AssetError::MoveNotDraft(move_id));
            }
            entry.state = MoveState::Cancel;
            for asset_id in book.assets_of_move(move_id) {
                book.asset_mut(asset_id)?.active = false;
            }
            info!(move_id = %move_id, "Entry cancelled");
            Ok(())
        })
    }

    pub(super) fn validate_asset(&mut self, asset_id: AssetId) -> Result<(), AssetError> {
        let asset = self.asset(asset_id)?;
        LifecycleService::check_validate(asset, self.asset_entries(asset_id).len())?;

        self.asset_mut(asset_id)?.state = AssetState::Open;
        let generated = self.rebuild_board(asset_id, &[], false)?;

        let last_remaining = self
            .asset_entries(asset_id)
            .last()
            .map(|m| m.asset_remaining_value);
        LifecycleService::check_schedule_closes(self.asset(asset_id)?, last_remaining)?;

        let today = self.today();
        let due: Vec<MoveId> = self
            .asset_entries(asset_id)
            .into_iter()
            .filter(|m| m.is_draft() && m.date <= today)
            .map(|m| m.id)
            .collect();
        for move_id in &due {
            self.post_entry(*move_id)?;
        }
        info!(
            asset_id = %asset_id,
            entries = generated,
            posted = due.len(),
            "Asset validated"
        );
        Ok(())
    }

    pub(super) fn post_entry(&mut self, move_id: MoveId) -> Result<(), AssetError> {
        let today = self.today();
        let entry = self.entry(move_id)?;
        LifecycleService::check_postable(entry, today)?;
        let (asset_id, kind, date, is_invoice, credits) = (
            entry.asset_id,
            entry.kind,
            entry.date,
            entry.kind == MoveKind::Invoice && entry.move_type.is_invoice(),
            entry.reversed_entry_id.is_some(),
        );

        self.entry_mut(move_id)?.state = MoveState::Posted;
        debug!(move_id = %move_id, asset_id = ?asset_id, kind = ?kind, "Entry posted");

        if let Some(asset_id) = asset_id {
            if kind == MoveKind::Disposal {
                let asset = self.asset_mut(asset_id)?;
                asset.state = AssetState::Close;
                asset.disposal_date = Some(date);
                info!(asset_id = %asset_id, disposal_date = %date, "Asset disposed");
            } else if LifecycleService::should_auto_close(self.asset(asset_id)?, &self.asset_entries(asset_id)) {
                self.asset_mut(asset_id)?.state = AssetState::Close;
                info!(asset_id = %asset_id, "Asset fully recognised and closed");
            }
        }

        if is_invoice {
            if credits {
                self.delete_reversed_entry_assets(move_id)?;
            } else {
                self.auto_create_assets(move_id)?;
            }
        }
        Ok(())
    }

    fn dispose(
        &mut self,
        asset_id: AssetId,
        invoice_line_ids: &[MoveLineId],
        date: NaiveDate,
    ) -> Result<MoveId, AssetError> {
        let asset = self.asset(asset_id)?.clone();
        LifecycleService::check_disposal_date(&asset, self.posted_entries(asset_id), date)?;

        for draft in self.draft_entries(asset_id) {
            self.remove_move(draft)?;
        }

        let asset_account = asset
            .original_move_line_ids
            .first()
            .and_then(|id| self.line(*id).ok())
            .map(|(_, l)| l.account_id)
            .or(asset.accounts.asset)
            .ok_or(AssetError::MissingAssetAccount(asset_id))?;
        let depreciated: Decimal = self
            .posted_entries(asset_id)
            .iter()
            .map(|m| m.amount_total)
            .sum::<Decimal>()
            + asset.already_depreciated_amount_import;
        let proceeds = invoice_line_ids
            .iter()
            .map(|id| self.line(*id).map(|(_, l)| (l.account_id, l.price_subtotal)))
            .collect::<Result<Vec<_>, _>>()?;
        let company = self.company(asset.company_id)?;
        let values = DisposalValues {
            asset_account,
            depreciated,
            proceeds,
            gain_account: company.gain_account_id,
            loss_account: company.loss_account_id,
        };

        let ctx = self.posting_context(&asset, date)?;
        let lines = EntryFactory::disposal_lines(&asset, &values, &ctx)?;
        let reference = if invoice_line_ids.is_empty() {
            format!("{}: Disposal", asset.name)
        } else {
            format!("{}: Sale", asset.name)
        };
        let input = MoveInput {
            reference,
            journal_id: asset.journal_id,
            partner_id: ctx.partner_id,
            asset_id: Some(asset_id),
            amount_total: self.value_residual(asset_id)?,
            lines,
            ..MoveInput::new(MoveKind::Disposal, MoveType::Entry, asset.company_id, date, asset.currency)
        };
        let move_id = self.insert_move(input, MoveState::Draft)?;
        self.rethread(asset_id)?;
        info!(
            asset_id = %asset_id,
            move_id = %move_id,
            sale = !invoice_line_ids.is_empty(),
            "Disposal entry created"
        );
        Ok(move_id)
    }
}
