//! Depreciation ledger entries.
//!
//! This module implements:
//! - Ledger entries ("moves") and their lines
//! - The posting rule resolved from the asset type
//! - The entry factory for depreciation, disposal, value increase and reversal entries
//! - Balance checks

pub mod entry;
pub mod factory;
pub mod validation;

#[cfg(test)]
mod factory_props;

pub use entry::{Move, MoveInput, MoveKind, MoveLine, MoveLineInput, MoveState, MoveType};
pub use factory::{AssetEntry, DisposalValues, EntryFactory, PostingContext, PostingRule};
pub use validation::validate_lines;
