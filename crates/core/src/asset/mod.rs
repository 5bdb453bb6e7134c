//! Asset records.
//!
//! This module defines:
//! - Asset types, states, methods and depreciation terms
//! - Inputs for creating assets and asset models
//! - Error types shared by every asset operation

pub mod error;
pub mod types;

pub use error::AssetError;
pub use types::{
    Asset, AssetAccounts, AssetState, AssetType, CreateAssetInput, DepreciationMethod,
    DepreciationTerms, FamilyTotals, LifecycleStage, MethodPeriod,
};
