//! In-memory asset book.
//!
//! The book owns every record the engine works on: companies, accounts,
//! exchange rates, assets (an arena with an explicit parent index) and ledger
//! entries. Mutations go through [`AssetBook::transaction`], which restores the
//! previous state when the operation fails.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Local, NaiveDate};
use deprecia_shared::types::{AccountId, AssetId, CompanyId, MoveId, MoveLineId, PartnerId};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::reference::{Account, Company};
use crate::asset::{Asset, AssetError, AssetState, CreateAssetInput, FamilyTotals, LifecycleStage};
use crate::currency::{ExchangeRate, RateTable};
use crate::ledger::{Move, MoveInput, MoveKind, MoveLine, MoveLineInput, MoveState, PostingContext, validate_lines};
use crate::lifecycle::LifecycleService;
use crate::reversal::{BoardEntry, ReversalService};

/// The asset book.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetBook {
    companies: HashMap<CompanyId, Company>,
    accounts: HashMap<AccountId, Account>,
    rates: RateTable,
    assets: BTreeMap<AssetId, Asset>,
    children: BTreeMap<AssetId, BTreeSet<AssetId>>,
    moves: BTreeMap<MoveId, Move>,
    /// Reversed entry to its mirror.
    reversals: BTreeMap<MoveId, MoveId>,
    next_asset: u64,
    next_move: u64,
    next_line: u64,
    today: Option<NaiveDate>,
}

impl AssetBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `op` atomically: on error the book is restored to its prior state.
    ///
    /// # Errors
    ///
    /// Returns whatever `op` returns.
    pub fn transaction<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, AssetError>,
    ) -> Result<T, AssetError> {
        let snapshot = self.clone();
        let result = op(self);
        if let Err(err) = &result {
            warn!(error = %err, code = err.error_code(), "Operation rolled back");
            *self = snapshot;
        }
        result
    }

    // ========== Clock ==========

    /// Current date, the local calendar date unless overridden.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Pins the current date; `None` goes back to the system clock.
    pub fn set_today(&mut self, today: Option<NaiveDate>) {
        self.today = today;
    }

    // ========== Reference data ==========

    /// Registers a company.
    pub fn add_company(&mut self, company: Company) -> CompanyId {
        let id = company.id;
        self.companies.insert(id, company);
        id
    }

    /// Registers an account.
    pub fn add_account(&mut self, account: Account) -> AccountId {
        let id = account.id;
        self.accounts.insert(id, account);
        id
    }

    /// Registers an exchange rate.
    pub fn add_rate(&mut self, rate: ExchangeRate) {
        self.rates.add(rate);
    }

    /// Looks up a company.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::CompanyNotFound` for an unknown ID.
    pub fn company(&self, id: CompanyId) -> Result<&Company, AssetError> {
        self.companies.get(&id).ok_or(AssetError::CompanyNotFound(id))
    }

    /// Mutable access to a company.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::CompanyNotFound` for an unknown ID.
    pub fn company_mut(&mut self, id: CompanyId) -> Result<&mut Company, AssetError> {
        self.companies.get_mut(&id).ok_or(AssetError::CompanyNotFound(id))
    }

    /// Looks up an account.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::AccountNotFound` for an unknown ID.
    pub fn account(&self, id: AccountId) -> Result<&Account, AssetError> {
        self.accounts.get(&id).ok_or(AssetError::AccountNotFound(id))
    }

    /// Known exchange rates.
    #[must_use]
    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    // ========== Queries ==========

    /// Looks up an asset.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::AssetNotFound` for an unknown ID.
    pub fn asset(&self, id: AssetId) -> Result<&Asset, AssetError> {
        self.assets.get(&id).ok_or(AssetError::AssetNotFound(id))
    }

    /// All assets and models, by ID.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    /// Direct children of an asset.
    pub fn children(&self, id: AssetId) -> impl Iterator<Item = &Asset> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.assets.get(child))
    }

    /// Looks up a ledger entry.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MoveNotFound` for an unknown ID.
    pub fn entry(&self, id: MoveId) -> Result<&Move, AssetError> {
        self.moves.get(&id).ok_or(AssetError::MoveNotFound(id))
    }

    /// All ledger entries, by ID.
    pub fn entries(&self) -> impl Iterator<Item = &Move> {
        self.moves.values()
    }

    /// Looks up a ledger line and its entry.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::LineNotFound` for an unknown ID.
    pub fn line(&self, id: MoveLineId) -> Result<(&Move, &MoveLine), AssetError> {
        self.moves
            .values()
            .find_map(|m| m.lines.iter().find(|l| l.id == id).map(|l| (m, l)))
            .ok_or(AssetError::LineNotFound(id))
    }

    /// Entries on the board of an asset, cancelled ones excluded, by date then ID.
    #[must_use]
    pub fn asset_entries(&self, id: AssetId) -> Vec<&Move> {
        let mut entries: Vec<&Move> = self
            .moves
            .values()
            .filter(|m| m.asset_id == Some(id) && m.state != MoveState::Cancel)
            .collect();
        entries.sort_by_key(|m| (m.date, m.id));
        entries
    }

    /// Returns true if the entry has been reversed.
    #[must_use]
    pub fn is_reversed(&self, id: MoveId) -> bool {
        self.reversals.contains_key(&id)
    }

    /// Mirror entry of a reversed entry.
    #[must_use]
    pub fn reversal_of(&self, id: MoveId) -> Option<MoveId> {
        self.reversals.get(&id).copied()
    }

    /// Posted, unreversed entries of an asset, by date then ID.
    #[must_use]
    pub fn posted_entries(&self, id: AssetId) -> Vec<&Move> {
        self.asset_entries(id)
            .into_iter()
            .filter(|m| m.is_posted() && !self.is_reversed(m.id))
            .collect()
    }

    /// IDs of the draft entries of an asset, by date then ID.
    #[must_use]
    pub fn draft_entries(&self, id: AssetId) -> Vec<MoveId> {
        self.asset_entries(id)
            .into_iter()
            .filter(|m| m.is_draft())
            .map(|m| m.id)
            .collect()
    }

    /// Number of posted, unreversed ordinary depreciation entries of an asset.
    #[must_use]
    pub fn posted_depreciation_count(&self, id: AssetId) -> u32 {
        let count = self
            .posted_entries(id)
            .into_iter()
            .filter(|m| m.kind == MoveKind::Depreciation)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Assets created from a ledger line.
    #[must_use]
    pub fn linked_assets(&self, line_id: MoveLineId) -> Vec<AssetId> {
        self.assets
            .values()
            .filter(|a| a.original_move_line_ids.contains(&line_id))
            .map(|a| a.id)
            .collect()
    }

    /// Assets created from any line of a ledger entry.
    #[must_use]
    pub fn assets_of_move(&self, move_id: MoveId) -> Vec<AssetId> {
        let Some(entry) = self.moves.get(&move_id) else {
            return Vec::new();
        };
        let lines: BTreeSet<MoveLineId> = entry.lines.iter().map(|l| l.id).collect();
        self.assets
            .values()
            .filter(|a| a.original_move_line_ids.iter().any(|l| lines.contains(l)))
            .map(|a| a.id)
            .collect()
    }

    /// Residual value still to depreciate.
    ///
    /// Original value minus salvage value, imported depreciation and the
    /// amounts of posted, unreversed board entries.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::AssetNotFound` for an unknown ID.
    pub fn value_residual(&self, id: AssetId) -> Result<Decimal, AssetError> {
        let asset = self.asset(id)?;
        let posted: Decimal = self.posted_entries(id).iter().map(|m| m.amount_total).sum();
        Ok(asset.opening_residual() - posted)
    }

    /// Book value: residual value plus salvage value.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::AssetNotFound` for an unknown ID.
    pub fn book_value(&self, id: AssetId) -> Result<Decimal, AssetError> {
        Ok(self.value_residual(id)? + self.asset(id)?.salvage_value)
    }

    /// Residual, salvage and book value of an asset and its direct children.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::AssetNotFound` for an unknown ID.
    pub fn family_totals(&self, id: AssetId) -> Result<FamilyTotals, AssetError> {
        let members: Vec<AssetId> = std::iter::once(id)
            .chain(self.children(id).map(|c| c.id))
            .collect();
        let mut totals = FamilyTotals::default();
        for member in members {
            let residual = self.value_residual(member)?;
            let salvage = self.asset(member)?.salvage_value;
            totals.value_residual += residual;
            totals.salvage_value += salvage;
            totals.book_value += residual + salvage;
        }
        Ok(totals)
    }

    /// Lifecycle stage of an asset.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::AssetNotFound` for an unknown ID.
    pub fn lifecycle_stage(&self, id: AssetId) -> Result<LifecycleStage, AssetError> {
        let asset = self.asset(id)?;
        Ok(LifecycleService::stage(asset, !self.draft_entries(id).is_empty()))
    }

    /// Board entries of an asset as seen by the running totals.
    #[must_use]
    pub fn board(&self, id: AssetId) -> Vec<BoardEntry> {
        self.asset_entries(id)
            .into_iter()
            .map(|m| BoardEntry::from_move(m, self.is_reversed(m.id)))
            .collect()
    }

    /// Company-level posting data of an asset entry dated `date`.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::CompanyNotFound` for an unknown company and
    /// `AssetError::NoExchangeRate` when the asset currency cannot be converted.
    pub fn posting_context(&self, asset: &Asset, date: NaiveDate) -> Result<PostingContext, AssetError> {
        let company = self.company(asset.company_id)?;
        let rate = self.rates.rate(asset.currency, company.currency, date)?;

        let sources: Vec<(&Move, &MoveLine)> = asset
            .original_move_line_ids
            .iter()
            .filter_map(|id| self.line(*id).ok())
            .collect();
        let mut partners: Vec<PartnerId> = Vec::new();
        for partner in sources.iter().filter_map(|(_, l)| l.partner_id) {
            if !partners.contains(&partner) {
                partners.push(partner);
            }
        }
        let refund_origin = sources.first().is_some_and(|(m, _)| m.move_type.is_refund());

        Ok(PostingContext {
            company_currency: company.currency,
            rate,
            partner_id: if partners.len() == 1 { partners.first().copied() } else { None },
            refund_origin,
        })
    }

    // ========== Primitives ==========

    pub(super) fn asset_mut(&mut self, id: AssetId) -> Result<&mut Asset, AssetError> {
        self.assets.get_mut(&id).ok_or(AssetError::AssetNotFound(id))
    }

    pub(super) fn entry_mut(&mut self, id: MoveId) -> Result<&mut Move, AssetError> {
        self.moves.get_mut(&id).ok_or(AssetError::MoveNotFound(id))
    }

    /// Stores a new asset built from `input` in `state`.
    pub(super) fn insert_asset(
        &mut self,
        input: CreateAssetInput,
        state: AssetState,
        parent_id: Option<AssetId>,
    ) -> Result<AssetId, AssetError> {
        let company = self.company(input.company_id)?;
        let currency = input.currency.unwrap_or(company.currency);

        self.next_asset += 1;
        let id = AssetId::from_raw(self.next_asset);
        let asset = Asset {
            id,
            name: input.name,
            asset_type: input.asset_type,
            state,
            active: true,
            company_id: input.company_id,
            currency,
            journal_id: input.journal_id,
            original_value: input.original_value,
            salvage_value: input.salvage_value,
            already_depreciated_amount_import: input.already_depreciated_amount_import,
            depreciation_number_import: input.depreciation_number_import,
            first_depreciation_date_import: input.first_depreciation_date_import,
            acquisition_date: input.acquisition_date,
            first_depreciation_date: input.first_depreciation_date,
            disposal_date: None,
            terms: input.terms,
            accounts: input.accounts,
            parent_id,
            model_id: input.model_id,
            original_move_line_ids: input.original_move_line_ids,
        };
        self.assets.insert(id, asset);
        if let Some(parent) = parent_id {
            self.children.entry(parent).or_default().insert(id);
        }
        Ok(id)
    }

    /// Removes an asset, its draft entries and its place in the parent index.
    pub(super) fn remove_asset(&mut self, id: AssetId) -> Result<Asset, AssetError> {
        for draft in self.draft_entries(id) {
            self.moves.remove(&draft);
        }
        let asset = self.assets.remove(&id).ok_or(AssetError::AssetNotFound(id))?;
        if let Some(parent) = asset.parent_id
            && let Some(siblings) = self.children.get_mut(&parent)
        {
            siblings.remove(&id);
        }
        self.children.remove(&id);
        Ok(asset)
    }

    /// Stores a new ledger entry in `state`.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::UnbalancedMove` if the lines do not balance and
    /// `AssetError::CompanyNotFound` for an unknown company.
    pub(super) fn insert_move(&mut self, input: MoveInput, state: MoveState) -> Result<MoveId, AssetError> {
        validate_lines(&input.lines)?;
        self.company(input.company_id)?;

        self.next_move += 1;
        let id = MoveId::from_raw(self.next_move);
        let lines = self.materialise_lines(id, input.lines);
        let entry = Move {
            id,
            kind: input.kind,
            move_type: input.move_type,
            state,
            date: input.date,
            reference: input.reference,
            company_id: input.company_id,
            journal_id: input.journal_id,
            currency: input.currency,
            partner_id: input.partner_id,
            asset_id: input.asset_id,
            amount_total: input.amount_total,
            asset_remaining_value: input.asset_remaining_value,
            asset_depreciated_value: input.asset_depreciated_value,
            auto_post: input.auto_post,
            reversed_entry_id: input.reversed_entry_id,
            lines,
        };
        self.moves.insert(id, entry);
        Ok(id)
    }

    /// Replaces the lines of an entry.
    pub(super) fn replace_lines(&mut self, id: MoveId, lines: Vec<MoveLineInput>) -> Result<(), AssetError> {
        validate_lines(&lines)?;
        let lines = self.materialise_lines(id, lines);
        self.entry_mut(id)?.lines = lines;
        Ok(())
    }

    pub(super) fn remove_move(&mut self, id: MoveId) -> Result<Move, AssetError> {
        self.moves.remove(&id).ok_or(AssetError::MoveNotFound(id))
    }

    pub(super) fn record_reversal(&mut self, reversed: MoveId, mirror: MoveId) {
        self.reversals.insert(reversed, mirror);
    }

    /// Rewrites the running totals of an asset's board from its opening residual.
    pub(super) fn rethread(&mut self, id: AssetId) -> Result<(), AssetError> {
        let opening = self.asset(id)?.opening_residual();
        let totals = ReversalService::rethread(opening, &self.board(id));
        for total in &totals {
            let entry = self.entry_mut(total.move_id)?;
            entry.asset_remaining_value = total.remaining_value;
            entry.asset_depreciated_value = total.depreciated_value;
        }
        debug!(asset_id = %id, entries = totals.len(), "Running totals re-threaded");
        Ok(())
    }

    fn materialise_lines(&mut self, move_id: MoveId, lines: Vec<MoveLineInput>) -> Vec<MoveLine> {
        let mut materialised = Vec::with_capacity(lines.len());
        for line in lines {
            self.next_line += 1;
            materialised.push(line.into_line(MoveLineId::from_raw(self.next_line), move_id));
        }
        materialised
    }
}
