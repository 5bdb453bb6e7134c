//! Depreciation boards: generation, manual edits and reversal of posted entries.

use chrono::NaiveDate;
use deprecia_shared::types::{AssetId, MoveId};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::store::AssetBook;
use crate::asset::{AssetError, AssetState};
use crate::ledger::{AssetEntry, EntryFactory, MoveKind, MoveState};
use crate::lifecycle::LifecycleService;
use crate::reversal::{CarryForward, ReversalService};
use crate::schedule::{PostedHistory, ScheduleGenerator, ScheduleParams};

impl AssetBook {
    /// Regenerates the draft entries of an open asset.
    ///
    /// Posted entries are kept; the remaining value is spread over the
    /// remaining periods.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidAssetState` unless the asset is open.
    pub fn compute_depreciation_board(&mut self, asset_id: AssetId) -> Result<usize, AssetError> {
        self.transaction(|book| {
            LifecycleService::ensure_state(book.asset(asset_id)?, AssetState::Open)?;
            book.rebuild_board(asset_id, &[], false)
        })
    }

    /// Changes the amounts of draft depreciation entries.
    ///
    /// Drafts up to the last edited one are kept as they are; the rest of the
    /// board is regenerated so that the schedule still ends at zero.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::NotEditableDepreciation` if an entry is not a draft
    /// depreciation of the asset and `AssetError::ScheduleDoesNotClose` if the
    /// edited schedule cannot end at zero.
    pub fn edit_draft_amounts(&mut self, asset_id: AssetId, edits: &[(MoveId, Decimal)]) -> Result<(), AssetError> {
        self.transaction(|book| {
            let asset = book.asset(asset_id)?.clone();
            LifecycleService::ensure_state(&asset, AssetState::Open)?;

            let mut last_edited = None;
            for (move_id, amount) in edits {
                let entry = book.entry(*move_id)?;
                if entry.asset_id != Some(asset_id) || !entry.is_draft() || entry.kind != MoveKind::Depreciation {
                    return Err(AssetError::NotEditableDepreciation {
                        asset_id,
                        move_id: *move_id,
                    });
                }
                let key = (entry.date, entry.id);
                last_edited = last_edited.max(Some(key));

                let ctx = book.posting_context(&asset, entry.date)?;
                let lines = EntryFactory::depreciation_lines(&asset, *amount, ctx.to_company(*amount), &ctx)?;
                book.replace_lines(*move_id, lines)?;
                book.entry_mut(*move_id)?.amount_total = *amount;
            }

            let keep: Vec<MoveId> = book
                .asset_entries(asset_id)
                .into_iter()
                .filter(|m| m.is_draft() && Some((m.date, m.id)) <= last_edited)
                .map(|m| m.id)
                .collect();
            book.rebuild_board(asset_id, &keep, false)?;

            let last_remaining = book.asset_entries(asset_id).last().map(|m| m.asset_remaining_value);
            LifecycleService::check_schedule_closes(&asset, last_remaining)?;
            info!(asset_id = %asset_id, edited = edits.len(), "Depreciation amounts edited");
            Ok(())
        })
    }

    /// Reverses a posted entry with a mirror entry dated `date`.
    ///
    /// Reversing a depreciation entry moves its amount back onto the board:
    /// into the first draft depreciation, or onto a new draft one period after
    /// the last entry. Reversing a disposal reopens the asset. Reversing an
    /// invoice removes the assets it created while they are still drafts.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MoveNotPosted` unless the entry is posted and
    /// `AssetError::MoveAlreadyReversed` if it was reversed before.
    pub fn reverse_move(&mut self, move_id: MoveId, date: NaiveDate) -> Result<MoveId, AssetError> {
        self.transaction(|book| book.reverse_entry(move_id, date))
    }

    fn reverse_entry(&mut self, move_id: MoveId, date: NaiveDate) -> Result<MoveId, AssetError> {
        let original = self.entry(move_id)?.clone();
        if !original.is_posted() {
            return Err(AssetError::MoveNotPosted(move_id));
        }
        if self.is_reversed(move_id) {
            return Err(AssetError::MoveAlreadyReversed(move_id));
        }

        let plan = match original.asset_id {
            Some(asset_id) if original.kind != MoveKind::Disposal => {
                let asset = self.asset(asset_id)?;
                // A disposed asset gets its disposal reversed first.
                if asset.disposal_date.is_some() {
                    LifecycleService::ensure_state(asset, AssetState::Open)?;
                }
                Some(ReversalService::plan(
                    &self.board(asset_id),
                    move_id,
                    asset.terms.method_period,
                    self.company(asset.company_id)?.fiscal_year_end,
                )?)
            }
            _ => None,
        };

        let mirror = EntryFactory::reversal_move(&original, date);
        let mirror_id = self.insert_move(mirror, MoveState::Posted)?;
        self.record_reversal(move_id, mirror_id);

        if let Some(asset_id) = original.asset_id {
            match plan {
                None => {
                    let asset = self.asset_mut(asset_id)?;
                    asset.state = AssetState::Open;
                    asset.disposal_date = None;
                    self.rebuild_board(asset_id, &[], false)?;
                    info!(asset_id = %asset_id, "Disposal reversed, asset reopened");
                }
                Some(plan) => {
                    for totals in &plan.adjusted {
                        let entry = self.entry_mut(totals.move_id)?;
                        entry.asset_remaining_value = totals.remaining_value;
                        entry.asset_depreciated_value = totals.depreciated_value;
                    }
                    self.carry_forward(asset_id, plan.carry_forward)?;
                    let asset = self.asset_mut(asset_id)?;
                    if asset.state == AssetState::Close {
                        asset.state = AssetState::Open;
                    }
                    self.rethread(asset_id)?;
                }
            }
        }

        if original.kind == MoveKind::Invoice && original.move_type.is_invoice() {
            self.delete_reversed_entry_assets(mirror_id)?;
        }

        info!(
            move_id = %move_id,
            reversal_id = %mirror_id,
            asset_id = ?original.asset_id,
            "Entry reversed"
        );
        Ok(mirror_id)
    }

    fn carry_forward(&mut self, asset_id: AssetId, carry: CarryForward) -> Result<(), AssetError> {
        let asset = self.asset(asset_id)?.clone();
        match carry {
            CarryForward::Fold { move_id, amount } => {
                let date = self.entry(move_id)?.date;
                let ctx = self.posting_context(&asset, date)?;
                let lines = EntryFactory::depreciation_lines(&asset, amount, ctx.to_company(amount), &ctx)?;
                self.replace_lines(move_id, lines)?;
                self.entry_mut(move_id)?.amount_total = amount;
                debug!(asset_id = %asset_id, move_id = %move_id, amount = %amount, "Reversed amount folded");
            }
            CarryForward::NewEntry {
                date,
                amount,
                remaining_value,
                depreciated_value,
            } => {
                let entry = AssetEntry {
                    kind: MoveKind::Depreciation,
                    reference: format!("Report of reversal for {}", asset.name),
                    date,
                    amount,
                    remaining_value,
                    depreciated_value,
                    auto_post: true,
                };
                let ctx = self.posting_context(&asset, date)?;
                let input = EntryFactory::depreciation_move(&asset, &entry, &ctx)?;
                let move_id = self.insert_move(input, MoveState::Draft)?;
                debug!(asset_id = %asset_id, move_id = %move_id, amount = %amount, "Reversed amount carried forward");
            }
            CarryForward::Nothing => {}
        }
        Ok(())
    }

    /// Drops draft entries not in `keep` and regenerates the rest of the schedule.
    ///
    /// Returns the number of generated entries.
    pub(super) fn rebuild_board(
        &mut self,
        asset_id: AssetId,
        keep: &[MoveId],
        ignore_prorata: bool,
    ) -> Result<usize, AssetError> {
        for draft in self.draft_entries(asset_id) {
            if !keep.contains(&draft) {
                self.remove_move(draft)?;
            }
        }

        let asset = self.asset(asset_id)?.clone();
        let fiscal_year_end = self.company(asset.company_id)?.fiscal_year_end;
        let history = self.history(asset_id)?;
        let params = ScheduleParams::for_asset(&asset, &history, fiscal_year_end, ignore_prorata)?;
        let installments = ScheduleGenerator::generate(&params)?;

        let offset = asset.depreciation_number_import + history.entries;
        for installment in &installments {
            let entry = EntryFactory::installment_entry(&asset, installment, offset);
            let ctx = self.posting_context(&asset, entry.date)?;
            let input = EntryFactory::depreciation_move(&asset, &entry, &ctx)?;
            self.insert_move(input, MoveState::Draft)?;
        }
        self.rethread(asset_id)?;

        debug!(
            asset_id = %asset_id,
            installments = installments.len(),
            residual = %history.residual,
            "Depreciation board computed"
        );
        Ok(installments.len())
    }

    /// What the board already carries: posted, unreversed entries and kept drafts.
    fn history(&self, asset_id: AssetId) -> Result<PostedHistory, AssetError> {
        let asset = self.asset(asset_id)?;
        let counted: Vec<_> = self
            .asset_entries(asset_id)
            .into_iter()
            .filter(|m| m.is_draft() || (m.is_posted() && !self.is_reversed(m.id)))
            .collect();

        let depreciated: Decimal = counted.iter().map(|m| m.amount_total).sum();
        let periods: Vec<_> = counted.iter().filter(|m| m.kind == MoveKind::Depreciation).collect();
        Ok(PostedHistory {
            entries: u32::try_from(periods.len()).unwrap_or(u32::MAX),
            depreciated,
            residual: asset.opening_residual() - depreciated,
            last_date: periods.last().map(|m| m.date),
        })
    }
}
