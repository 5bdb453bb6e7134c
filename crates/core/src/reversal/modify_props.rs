//! Property-based tests for value modification and reversal.
//!
//! - The family holds exactly the requested residual and salvage values
//! - The asset's book value is only reduced by the booked decrease
//! - Applying a reversal plan agrees with re-threading the board

use chrono::NaiveDate;
use deprecia_shared::types::MoveId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::modify::ModifyService;
use super::service::{BoardEntry, CarryForward, ReversalService};
use crate::asset::MethodPeriod;
use crate::ledger::{MoveKind, MoveState};
use crate::schedule::FiscalYearEnd;

/// Strategy for non-negative amounts (0.00 to 100,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Builds a yearly board of `amounts`, the first `posted` of them posted.
fn make_board(amounts: &[Decimal], posted: usize) -> (Decimal, Vec<BoardEntry>) {
    let opening: Decimal = amounts.iter().sum();
    let mut remaining = opening;
    let mut depreciated = Decimal::ZERO;
    let board = amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            remaining -= *amount;
            depreciated += *amount;
            BoardEntry {
                move_id: MoveId::from_raw(i as u64 + 1),
                date: NaiveDate::from_ymd_opt(2015 + i as i32, 12, 31).unwrap(),
                kind: MoveKind::Depreciation,
                state: if i < posted {
                    MoveState::Posted
                } else {
                    MoveState::Draft
                },
                amount: *amount,
                reversed: false,
                remaining_value: remaining,
                depreciated_value: depreciated,
            }
        })
        .collect();
    (opening, board)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Parent and child together hold the requested values.
    #[test]
    fn prop_family_matches_request(
        residual in amount(),
        salvage in amount(),
        requested_residual in amount(),
        requested_salvage in amount(),
    ) {
        let plan = ModifyService::plan(residual, salvage, requested_residual, requested_salvage);
        prop_assert_eq!(plan.parent_residual + plan.residual_increase, requested_residual);
        prop_assert_eq!(plan.parent_salvage + plan.salvage_increase, requested_salvage);
        prop_assert!(plan.parent_residual >= Decimal::ZERO);
        prop_assert!(plan.parent_salvage >= Decimal::ZERO);
    }

    /// The asset loses exactly the booked decrease.
    #[test]
    fn prop_parent_book_value_only_loses_decrease(
        residual in amount(),
        salvage in amount(),
        requested_residual in amount(),
        requested_salvage in amount(),
    ) {
        let plan = ModifyService::plan(residual, salvage, requested_residual, requested_salvage);
        prop_assert_eq!(
            plan.parent_residual + plan.parent_salvage + plan.decrease,
            residual + salvage
        );
        // A decrease and an increase never happen together.
        prop_assert!(plan.decrease.is_zero() || !plan.needs_child());
    }

    /// Reversing a posted entry gives the totals a full re-threading gives.
    #[test]
    fn prop_reversal_agrees_with_rethread(
        amounts in prop::collection::vec((1i64..500_000i64).prop_map(|c| Decimal::new(c, 2)), 2..10),
        posted_seed in any::<usize>(),
        reversed_seed in any::<usize>(),
    ) {
        let posted = 1 + posted_seed % amounts.len();
        let reversed = reversed_seed % posted;
        let (opening, mut board) = make_board(&amounts, posted);
        let target = board[reversed].move_id;

        let plan = ReversalService::plan(
            &board,
            target,
            MethodPeriod::Yearly,
            FiscalYearEnd::default(),
        )
        .unwrap();
        for totals in &plan.adjusted {
            let entry = board.iter_mut().find(|e| e.move_id == totals.move_id).unwrap();
            entry.remaining_value = totals.remaining_value;
            entry.depreciated_value = totals.depreciated_value;
        }
        board[reversed].reversed = true;
        match plan.carry_forward {
            CarryForward::Fold { move_id, amount } => {
                let entry = board.iter_mut().find(|e| e.move_id == move_id).unwrap();
                entry.amount = amount;
            }
            CarryForward::NewEntry { date, amount, remaining_value, depreciated_value } => {
                board.push(BoardEntry {
                    move_id: MoveId::from_raw(100),
                    date,
                    kind: MoveKind::Depreciation,
                    state: MoveState::Draft,
                    amount,
                    reversed: false,
                    remaining_value,
                    depreciated_value,
                });
            }
            CarryForward::Nothing => {}
        }

        let expected = ReversalService::rethread(opening, &board);
        for totals in expected {
            let entry = board.iter().find(|e| e.move_id == totals.move_id).unwrap();
            prop_assert_eq!(entry.remaining_value, totals.remaining_value);
            prop_assert_eq!(entry.depreciated_value, totals.depreciated_value);
        }
    }
}
