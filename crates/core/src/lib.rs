//! Core asset depreciation engine for Deprecia.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Assets, their depreciation boards and the ledger entries they post live in an
//! in-memory [`book::AssetBook`].
//!
//! # Modules
//!
//! - `asset` - Asset records, depreciation terms and errors
//! - `schedule` - Depreciation schedule computation
//! - `ledger` - Balanced ledger entries and the entries assets post
//! - `lifecycle` - State transitions: validation, posting, disposal
//! - `reversal` - Running totals, reversals and value modifications
//! - `invoice` - Assets created and removed by invoices and credit notes
//! - `currency` - Exchange rates and rounding
//! - `book` - The asset book tying the rules to stored records
//! - `report` - Depreciation table

pub mod asset;
pub mod book;
pub mod currency;
pub mod invoice;
pub mod ledger;
pub mod lifecycle;
pub mod report;
pub mod reversal;
pub mod schedule;
