//! Asset lifecycle: draft, open, running and close.
//!
//! The rules live in [`LifecycleService`]; [`crate::book::AssetBook`] applies
//! them when validating assets, posting entries and disposing of assets.

pub mod service;

pub use service::LifecycleService;
