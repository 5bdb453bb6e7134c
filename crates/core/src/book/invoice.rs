//! Invoice posting hooks.

use deprecia_shared::types::{AssetId, MoveId};
use tracing::info;

use super::store::AssetBook;
use crate::asset::AssetError;
use crate::invoice::{InvoiceService, LinkedAsset, LinkedLine, ReverseKey};
use crate::ledger::MoveLine;

impl AssetBook {
    /// Creates the assets of a posted invoice.
    ///
    /// Every eligible line on an account set to create assets gives one asset,
    /// or one per unit. Assets are validated right away when the account asks
    /// for it and provides a model.
    pub(super) fn auto_create_assets(&mut self, move_id: MoveId) -> Result<Vec<AssetId>, AssetError> {
        let entry = self.entry(move_id)?.clone();
        let company_currency = self.company(entry.company_id)?.currency;

        let mut created = Vec::new();
        for line in &entry.lines {
            let Ok(account) = self.account(line.account_id) else {
                continue;
            };
            let linked = !self.linked_assets(line.id).is_empty();
            let Some(config) = InvoiceService::eligible_config(&entry, line, account, linked) else {
                continue;
            };
            let plan = InvoiceService::plan_assets(&entry, line, account, config, company_currency)?;

            for input in plan.inputs {
                let asset_id = self.insert_draft_asset(input)?;
                if plan.validate {
                    self.validate_asset(asset_id)?;
                }
                created.push(asset_id);
            }
        }

        if !created.is_empty() {
            info!(move_id = %move_id, count = created.len(), "Assets created from invoice");
        }
        Ok(created)
    }

    /// Deletes the assets created by the invoice lines a credit note credits.
    ///
    /// Assets that progressed past draft, with posted entries, are kept.
    pub(super) fn delete_reversed_entry_assets(&mut self, credit_note_id: MoveId) -> Result<Vec<AssetId>, AssetError> {
        let note = self.entry(credit_note_id)?;
        let Some(original_id) = note.reversed_entry_id else {
            return Ok(Vec::new());
        };
        let credited: Vec<ReverseKey> = note
            .lines
            .iter()
            .filter(|l| l.is_invoice_line())
            .map(ReverseKey::of)
            .collect();

        let original = self.entry(original_id)?;
        let linked: Vec<LinkedLine> = original
            .lines
            .iter()
            .filter(|l| l.is_invoice_line())
            .map(|l| self.linked_line(l))
            .collect();

        let deleted = InvoiceService::assets_to_delete(&credited, &linked);
        for asset_id in &deleted {
            self.remove_asset(*asset_id)?;
        }
        if !deleted.is_empty() {
            info!(
                move_id = %credit_note_id,
                reversed_entry_id = %original_id,
                count = deleted.len(),
                "Assets of credited invoice lines deleted"
            );
        }
        Ok(deleted)
    }

    fn linked_line(&self, line: &MoveLine) -> LinkedLine {
        let assets = self
            .linked_assets(line.id)
            .into_iter()
            .map(|asset_id| LinkedAsset {
                asset_id,
                deletable: self.is_deletable_draft(asset_id),
            })
            .collect();
        LinkedLine {
            key: ReverseKey::of(line),
            multiple_assets_per_line: self
                .account(line.account_id)
                .is_ok_and(|a| a.multiple_assets_per_line()),
            assets,
        }
    }

    /// Draft, or every entry of its board still draft.
    fn is_deletable_draft(&self, asset_id: AssetId) -> bool {
        self.asset(asset_id).is_ok_and(|a| a.is_draft())
            || self.asset_entries(asset_id).iter().all(|m| m.is_draft())
    }
}
