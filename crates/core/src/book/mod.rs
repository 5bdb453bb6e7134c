//! The asset book.
//!
//! [`AssetBook`] owns companies, accounts, assets and ledger entries, and
//! applies the lifecycle, reversal, modification and invoice rules to them.
//! Every public mutation is atomic: a failing operation leaves the book as it
//! found it.
//!
//! Operations are grouped by concern:
//! - `assets`: creation, models, creation from journal items, deletion
//! - `lifecycle`: validation, posting, disposal, reset and cancellation
//! - `board`: schedule regeneration, draft edits and reversals
//! - `modify`: value modifications and child assets
//! - `invoice`: assets created and removed by invoices and credit notes

mod assets;
mod board;
mod invoice;
mod lifecycle;
mod modify;
pub mod reference;
mod store;


#[cfg(test)]
mod props;

pub use reference::{Account, AccountKind, AutoAssetConfig, Company, CreateAssetMode};
pub use store::AssetBook;
