//! Reversal and recomputation of asset boards.
//!
//! This module implements:
//! - Re-threading of the running totals stored on board entries
//! - The carry-forward of reversed depreciation onto the board
//! - The split of value modifications between an asset and a child asset

pub mod modify;
pub mod service;

#[cfg(test)]
mod modify_props;

pub use modify::{ModifyPlan, ModifyRequest, ModifyService};
pub use service::{BoardEntry, CarryForward, ReversalPlan, ReversalService, RunningTotals};
