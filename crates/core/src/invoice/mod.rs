//! Invoice posting hook.
//!
//! Posting a bill or invoice on an account configured for automatic asset
//! creation creates assets; posting a credit note of that document removes the
//! assets that never progressed.

pub mod service;

pub use service::{AutoAssetPlan, InvoiceService, LinkedAsset, LinkedLine, ReverseKey};
