//! Running totals of an asset board and the carry-forward of reversed depreciation.
//!
//! Every entry of a board stores the residual value and the cumulative
//! depreciation of the asset after it. Those totals are a materialised view of
//! the board: walking the entries by date then ID from the opening residual
//! must give the stored values back, whatever was reversed or edited.

use chrono::NaiveDate;
use deprecia_shared::types::MoveId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::asset::{AssetError, MethodPeriod};
use crate::ledger::{Move, MoveKind, MoveState};
use crate::schedule::{FiscalYearEnd, next_period_date};

/// One entry of an asset board, as seen by the running totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardEntry {
    /// The entry.
    pub move_id: MoveId,
    /// Accounting date.
    pub date: NaiveDate,
    /// What produced the entry.
    pub kind: MoveKind,
    /// Posting state.
    pub state: MoveState,
    /// Depreciation carried by the entry.
    pub amount: Decimal,
    /// Reversed entries no longer count as depreciation.
    pub reversed: bool,
    /// Stored residual value after the entry.
    pub remaining_value: Decimal,
    /// Stored cumulative depreciation after the entry.
    pub depreciated_value: Decimal,
}

impl BoardEntry {
    /// Reads a board entry off a ledger entry.
    #[must_use]
    pub fn from_move(entry: &Move, reversed: bool) -> Self {
        Self {
            move_id: entry.id,
            date: entry.date,
            kind: entry.kind,
            state: entry.state,
            amount: entry.amount_total,
            reversed,
            remaining_value: entry.asset_remaining_value,
            depreciated_value: entry.asset_depreciated_value,
        }
    }

    fn sort_key(&self) -> (NaiveDate, MoveId) {
        (self.date, self.move_id)
    }
}

/// Running totals of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningTotals {
    /// The entry.
    pub move_id: MoveId,
    /// Residual value after the entry.
    pub remaining_value: Decimal,
    /// Cumulative depreciation after the entry.
    pub depreciated_value: Decimal,
}

/// Where the reversed depreciation goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarryForward {
    /// Added to the first draft depreciation entry, giving it `amount`.
    Fold {
        /// Draft entry receiving the reversed depreciation.
        move_id: MoveId,
        /// Its new amount.
        amount: Decimal,
    },
    /// Booked on a new draft entry one period after the last entry.
    NewEntry {
        /// Date of the new entry.
        date: NaiveDate,
        /// Reversed depreciation.
        amount: Decimal,
        /// Residual value after the new entry.
        remaining_value: Decimal,
        /// Cumulative depreciation after the new entry.
        depreciated_value: Decimal,
    },
    /// Nothing was depreciated by the reversed entry.
    Nothing,
}

/// Changes to an asset board caused by reversing one of its posted entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalPlan {
    /// Amount of the reversed entry.
    pub reversed_amount: Decimal,
    /// New totals of the posted entries dated on or after the reversed entry.
    pub adjusted: Vec<RunningTotals>,
    /// Where the reversed amount goes.
    pub carry_forward: CarryForward,
}

/// Stateless running-total engine.
pub struct ReversalService;

impl ReversalService {
    /// Recomputes the running totals of a board from scratch.
    ///
    /// Entries are walked by date then ID starting from `opening_residual` and
    /// zero depreciation. Reversed entries carry their predecessor's totals.
    #[must_use]
    pub fn rethread(opening_residual: Decimal, entries: &[BoardEntry]) -> Vec<RunningTotals> {
        let mut ordered: Vec<&BoardEntry> = entries.iter().collect();
        ordered.sort_by_key(|e| e.sort_key());

        let mut remaining = opening_residual;
        let mut depreciated = Decimal::ZERO;
        ordered
            .into_iter()
            .map(|entry| {
                if !entry.reversed {
                    remaining -= entry.amount;
                    depreciated += entry.amount;
                }
                RunningTotals {
                    move_id: entry.move_id,
                    remaining_value: remaining,
                    depreciated_value: depreciated,
                }
            })
            .collect()
    }

    /// Plans the reversal of the posted entry `reversed`.
    ///
    /// Posted entries dated on or after it (itself included) no longer count
    /// its amount. The amount is then folded into the first draft depreciation
    /// entry or, without one, carried by a new entry one `period` after the last
    /// entry of the board.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MoveNotFound` if `reversed` is not on the board,
    /// `AssetError::MoveNotPosted` if it is not posted and
    /// `AssetError::MoveAlreadyReversed` if it was reversed before.
    pub fn plan(
        entries: &[BoardEntry],
        reversed: MoveId,
        period: MethodPeriod,
        fiscal_year_end: FiscalYearEnd,
    ) -> Result<ReversalPlan, AssetError> {
        let target = entries
            .iter()
            .find(|e| e.move_id == reversed)
            .ok_or(AssetError::MoveNotFound(reversed))?;
        if target.state != MoveState::Posted {
            return Err(AssetError::MoveNotPosted(reversed));
        }
        if target.reversed {
            return Err(AssetError::MoveAlreadyReversed(reversed));
        }
        let amount = target.amount;

        let adjusted: Vec<RunningTotals> = entries
            .iter()
            .filter(|e| e.state == MoveState::Posted && e.date >= target.date)
            .map(|e| RunningTotals {
                move_id: e.move_id,
                remaining_value: e.remaining_value + amount,
                depreciated_value: e.depreciated_value - amount,
            })
            .collect();

        let carry_forward = if amount.is_zero() {
            CarryForward::Nothing
        } else if let Some(draft) = entries
            .iter()
            .filter(|e| e.state == MoveState::Draft && e.kind == MoveKind::Depreciation)
            .min_by_key(|e| e.sort_key())
        {
            CarryForward::Fold {
                move_id: draft.move_id,
                amount: draft.amount + amount,
            }
        } else {
            let last = entries
                .iter()
                .filter(|e| e.state != MoveState::Cancel)
                .max_by_key(|e| e.sort_key())
                .ok_or(AssetError::MoveNotFound(reversed))?;
            let (remaining, depreciated) = adjusted
                .iter()
                .find(|t| t.move_id == last.move_id)
                .map_or((last.remaining_value, last.depreciated_value), |t| {
                    (t.remaining_value, t.depreciated_value)
                });
            CarryForward::NewEntry {
                date: next_period_date(last.date, period, fiscal_year_end)?,
                amount,
                remaining_value: remaining - amount,
                depreciated_value: depreciated + amount,
            }
        };

        Ok(ReversalPlan {
            reversed_amount: amount,
            adjusted,
            carry_forward,
        })
    }
}
