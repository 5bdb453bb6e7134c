//! Value modification of open assets.

use deprecia_shared::types::{AssetId, MoveLineId};
use rust_decimal::Decimal;
use tracing::info;

use super::store::AssetBook;
use crate::asset::{AssetError, AssetState, CreateAssetInput, DepreciationTerms};
use crate::ledger::{AssetEntry, EntryFactory, MoveKind, MoveState};
use crate::lifecycle::LifecycleService;
use crate::reversal::{ModifyRequest, ModifyService};

impl AssetBook {
    /// Re-evaluates an open asset and its children.
    ///
    /// The requested values are family totals: the asset is brought to what
    /// the request leaves once its children's values are taken out. A lower
    /// value is booked as a posted value decrease. A higher value is booked
    /// against `counterpart_account_id` and depreciated by a new child asset
    /// over the periods the asset has left. The asset's draft entries
    /// are regenerated with the new terms, and existing children follow the
    /// new duration.
    ///
    /// Returns the child created by a value increase.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidAssetState` unless the asset is open,
    /// `AssetError::UnpostedEntriesBeforeDate` if draft entries are dated on or
    /// before the modification, `AssetError::ModificationBelowChildren` when
    /// the children already hold more than requested and
    /// `AssetError::MissingCounterpartAccount` for an increase without
    /// counterpart account.
    pub fn modify(&mut self, asset_id: AssetId, request: &ModifyRequest) -> Result<Option<AssetId>, AssetError> {
        self.transaction(|book| book.modify_asset(asset_id, request))
    }

    fn modify_asset(&mut self, asset_id: AssetId, request: &ModifyRequest) -> Result<Option<AssetId>, AssetError> {
        let asset = self.asset(asset_id)?.clone();
        LifecycleService::ensure_state(&asset, AssetState::Open)?;
        if self
            .asset_entries(asset_id)
            .iter()
            .any(|m| m.is_draft() && m.date <= request.date)
        {
            return Err(AssetError::UnpostedEntriesBeforeDate {
                asset_id,
                date: request.date,
            });
        }

        // The request covers the whole family; children keep what they hold.
        let residual = self.value_residual(asset_id)?;
        let family = self.family_totals(asset_id)?;
        let children_residual = family.value_residual - residual;
        let children_salvage = family.salvage_value - asset.salvage_value;
        if request.value_residual < children_residual || request.salvage_value < children_salvage {
            return Err(AssetError::ModificationBelowChildren {
                asset_id,
                residual: children_residual,
                salvage: children_salvage,
            });
        }
        let plan = ModifyService::plan(
            residual,
            asset.salvage_value,
            request.value_residual - children_residual,
            request.salvage_value - children_salvage,
        );
        let reference = format!("{}: {}", asset.name, request.reason);
        let existing_children: Vec<AssetId> = self.children(asset_id).map(|c| c.id).collect();

        if plan.decrease > Decimal::ZERO {
            let entry = AssetEntry {
                kind: MoveKind::ValueDecrease,
                reference: reference.clone(),
                date: request.date,
                amount: plan.decrease,
                remaining_value: Decimal::ZERO,
                depreciated_value: Decimal::ZERO,
                auto_post: false,
            };
            let ctx = self.posting_context(&asset, request.date)?;
            let input = EntryFactory::depreciation_move(&asset, &entry, &ctx)?;
            let move_id = self.insert_move(input, MoveState::Posted)?;
            info!(asset_id = %asset_id, move_id = %move_id, amount = %plan.decrease, "Value decrease booked");
        }

        {
            let parent = self.asset_mut(asset_id)?;
            parent.salvage_value = plan.parent_salvage;
            parent.terms.method_number = request.method_number;
            parent.terms.method_period = request.method_period;
            if let Some(method) = request.method {
                parent.terms.method = method;
            }
        }
        self.rebuild_board(asset_id, &[], true)?;

        let updated = self.asset(asset_id)?.clone();
        let remaining_periods = updated
            .terms
            .method_number
            .saturating_sub(updated.depreciation_number_import)
            .saturating_sub(self.posted_depreciation_count(asset_id));

        let child_id = if plan.needs_child() {
            let counterpart = request
                .counterpart_account_id
                .ok_or(AssetError::MissingCounterpartAccount(asset_id))?;
            let ctx = self.posting_context(&updated, request.date)?;
            let input = EntryFactory::value_increase_move(
                &updated,
                counterpart,
                plan.increase(),
                request.date,
                reference.clone(),
                &ctx,
            )?;
            let increase_id = self.insert_move(input, MoveState::Posted)?;
            let asset_account = updated
                .accounts
                .asset
                .ok_or(AssetError::MissingAssetAccount(asset_id))?;
            let source_lines: Vec<MoveLineId> = self
                .entry(increase_id)?
                .lines_on(asset_account)
                .map(|l| l.id)
                .collect();

            let child = CreateAssetInput {
                currency: Some(updated.currency),
                journal_id: updated.journal_id,
                salvage_value: plan.salvage_increase,
                terms: DepreciationTerms {
                    method_number: remaining_periods,
                    prorata: false,
                    prorata_date: None,
                    ..updated.terms.clone()
                },
                accounts: updated.accounts,
                original_move_line_ids: source_lines,
                ..CreateAssetInput::new(
                    reference,
                    updated.asset_type,
                    updated.company_id,
                    plan.increase(),
                    request.date,
                )
            };
            let child_id = self.insert_asset(child, AssetState::Draft, Some(asset_id))?;
            self.validate_asset(child_id)?;
            info!(
                asset_id = %asset_id,
                child_id = %child_id,
                amount = %plan.increase(),
                "Value increase split into child asset"
            );
            Some(child_id)
        } else {
            None
        };

        for child_id in existing_children {
            if self.asset(child_id)?.state != AssetState::Open {
                continue;
            }
            let posted = self.posted_depreciation_count(child_id);
            {
                let child = self.asset_mut(child_id)?;
                child.terms.method_number = posted + remaining_periods;
                child.terms.method_period = request.method_period;
            }
            self.rebuild_board(child_id, &[], true)?;
        }

        info!(
            asset_id = %asset_id,
            value_residual = %request.value_residual,
            salvage_value = %request.salvage_value,
            "Asset modified"
        );
        Ok(child_id)
    }
}
