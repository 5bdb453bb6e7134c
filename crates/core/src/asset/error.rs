//! Asset engine error types.
//!
//! Every failure aborts the operation that raised it: the asset book restores
//! the state it had before the operation started.

use chrono::NaiveDate;
use deprecia_shared::AppError;
use deprecia_shared::types::{AccountId, AssetId, CompanyId, Currency, MoveId, MoveLineId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::AssetState;
use crate::schedule::ScheduleError;

/// Errors that can occur during asset operations.
#[derive(Debug, Error)]
pub enum AssetError {
    // ========== Configuration Errors ==========
    /// The depreciation or expense account of the asset is not set.
    #[error("Asset {0} has no depreciation account or no depreciation expense account")]
    MissingDepreciationAccounts(AssetId),

    /// An auto-create source line has no label.
    #[error("Journal items of {account_code} should have a label in order to generate an asset")]
    MissingLineLabel {
        /// Code of the auto-create account.
        account_code: String,
    },

    /// A model is missing fields required to configure an asset.
    #[error("Asset model {model_id} is incomplete: {reason}")]
    IncompleteModel {
        /// The model.
        model_id: AssetId,
        /// What is missing.
        reason: String,
    },

    /// The company has no gain or loss account for a disposal.
    #[error("Company {0} has no gain/loss account configured")]
    MissingGainLossAccount(CompanyId),

    /// A value increase needs a counterpart account.
    #[error("A counterpart account is required to increase the value of asset {0}")]
    MissingCounterpartAccount(AssetId),

    /// The asset has no gross value account.
    #[error("Asset {0} has no asset account")]
    MissingAssetAccount(AssetId),

    /// No exchange rate is known for the currency pair on the date.
    #[error("No exchange rate found for {from} to {to} on {date}")]
    NoExchangeRate {
        /// Source currency.
        from: Currency,
        /// Target currency.
        to: Currency,
        /// Date for which the rate was requested.
        date: NaiveDate,
    },

    /// The depreciation terms are invalid.
    #[error("Invalid depreciation terms: {0}")]
    Schedule(#[from] ScheduleError),

    // ========== State Transition Errors ==========
    /// The asset is not in the state the operation requires.
    #[error("Asset {asset_id} is {actual}, expected {expected}")]
    InvalidAssetState {
        /// The asset.
        asset_id: AssetId,
        /// Required state.
        expected: AssetState,
        /// Actual state.
        actual: AssetState,
    },

    /// The asset already has depreciation entries.
    #[error("Asset {0} already has depreciation entries")]
    ScheduleAlreadyGenerated(AssetId),

    /// The schedule does not bring the remaining value to zero.
    #[error("The remaining value on the last depreciation line of asset {asset_id} must be 0, got {remaining}")]
    ScheduleDoesNotClose {
        /// The asset.
        asset_id: AssetId,
        /// Remaining value of the last entry.
        remaining: Decimal,
    },

    /// Entries are posted after the disposal date.
    #[error("There are depreciations of asset {asset_id} posted after {disposal_date}, please revert them")]
    PostedEntriesAfterDisposal {
        /// The asset.
        asset_id: AssetId,
        /// Requested disposal date.
        disposal_date: NaiveDate,
    },

    /// A source entry cannot go back to draft while one of its assets progressed.
    #[error("You cannot reset to draft entry {move_id}: asset {asset_id} is no longer a draft")]
    ProgressedAssetOnReset {
        /// The source entry.
        move_id: MoveId,
        /// The asset blocking the reset.
        asset_id: AssetId,
    },

    /// Posted depreciation entries are corrected by reversal only.
    #[error("Depreciation entry {0} can only be reversed, not reset to draft")]
    DepreciationResetNotAllowed(MoveId),

    /// The entry is not a draft.
    #[error("Entry {0} is not a draft")]
    MoveNotDraft(MoveId),

    /// The entry is not posted.
    #[error("Entry {0} is not posted")]
    MoveNotPosted(MoveId),

    /// The entry was already reversed.
    #[error("Entry {0} is already reversed")]
    MoveAlreadyReversed(MoveId),

    /// The entry is scheduled for a future date.
    #[error("Entry {move_id} is scheduled for {date} and cannot be posted before that date")]
    FutureAutoPost {
        /// The entry.
        move_id: MoveId,
        /// Scheduled date.
        date: NaiveDate,
    },

    /// A value modification found draft entries dated before its date.
    #[error("There are unposted depreciations of asset {asset_id} prior to {date}, please deal with them first")]
    UnpostedEntriesBeforeDate {
        /// The asset.
        asset_id: AssetId,
        /// Modification date.
        date: NaiveDate,
    },

    /// A value modification asks for less than the asset's children hold.
    #[error("Asset {asset_id} cannot be modified below the values of its children (residual {residual}, salvage {salvage})")]
    ModificationBelowChildren {
        /// The asset.
        asset_id: AssetId,
        /// Residual value of the children.
        residual: Decimal,
        /// Salvage value of the children.
        salvage: Decimal,
    },

    /// The entry is not a draft depreciation entry of the asset.
    #[error("Entry {move_id} is not a draft depreciation of asset {asset_id}")]
    NotEditableDepreciation {
        /// The asset.
        asset_id: AssetId,
        /// The entry.
        move_id: MoveId,
    },

    /// Source lines cannot be turned into an asset.
    #[error("Cannot create an asset from these lines: {0}")]
    InvalidSourceLines(String),

    // ========== Reference Errors ==========
    /// Asset not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    /// Entry not found.
    #[error("Entry not found: {0}")]
    MoveNotFound(MoveId),

    /// Entry line not found.
    #[error("Entry line not found: {0}")]
    LineNotFound(MoveLineId),

    /// Company not found.
    #[error("Company not found: {0}")]
    CompanyNotFound(CompanyId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Only draft assets without posted entries can be deleted.
    #[error("Asset {asset_id} cannot be deleted while {state}")]
    CannotDeleteAsset {
        /// The asset.
        asset_id: AssetId,
        /// Its state.
        state: AssetState,
    },

    /// The asset has posted entries.
    #[error("Asset {0} has posted entries")]
    AssetHasPostedEntries(AssetId),

    // ========== Integrity Errors ==========
    /// Entry debits and credits differ.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedMove {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AssetError {
    /// Returns the error code for machine-readable output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingDepreciationAccounts(_) => "MISSING_DEPRECIATION_ACCOUNTS",
            Self::MissingLineLabel { .. } => "MISSING_LINE_LABEL",
            Self::IncompleteModel { .. } => "INCOMPLETE_MODEL",
            Self::MissingGainLossAccount(_) => "MISSING_GAIN_LOSS_ACCOUNT",
            Self::MissingCounterpartAccount(_) => "MISSING_COUNTERPART_ACCOUNT",
            Self::MissingAssetAccount(_) => "MISSING_ASSET_ACCOUNT",
            Self::NoExchangeRate { .. } => "NO_EXCHANGE_RATE",
            Self::Schedule(_) => "INVALID_TERMS",
            Self::InvalidAssetState { .. } => "INVALID_ASSET_STATE",
            Self::ScheduleAlreadyGenerated(_) => "SCHEDULE_ALREADY_GENERATED",
            Self::ScheduleDoesNotClose { .. } => "SCHEDULE_DOES_NOT_CLOSE",
            Self::PostedEntriesAfterDisposal { .. } => "POSTED_ENTRIES_AFTER_DISPOSAL",
            Self::ProgressedAssetOnReset { .. } => "PROGRESSED_ASSET_ON_RESET",
            Self::DepreciationResetNotAllowed(_) => "DEPRECIATION_RESET_NOT_ALLOWED",
            Self::MoveNotDraft(_) => "MOVE_NOT_DRAFT",
            Self::MoveNotPosted(_) => "MOVE_NOT_POSTED",
            Self::MoveAlreadyReversed(_) => "MOVE_ALREADY_REVERSED",
            Self::FutureAutoPost { .. } => "FUTURE_AUTO_POST",
            Self::UnpostedEntriesBeforeDate { .. } => "UNPOSTED_ENTRIES_BEFORE_DATE",
            Self::ModificationBelowChildren { .. } => "MODIFICATION_BELOW_CHILDREN",
            Self::NotEditableDepreciation { .. } => "NOT_EDITABLE_DEPRECIATION",
            Self::InvalidSourceLines(_) => "INVALID_SOURCE_LINES",
            Self::AssetNotFound(_) => "ASSET_NOT_FOUND",
            Self::MoveNotFound(_) => "MOVE_NOT_FOUND",
            Self::LineNotFound(_) => "LINE_NOT_FOUND",
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CannotDeleteAsset { .. } => "CANNOT_DELETE_ASSET",
            Self::AssetHasPostedEntries(_) => "ASSET_HAS_POSTED_ENTRIES",
            Self::UnbalancedMove { .. } => "UNBALANCED_MOVE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true for errors caused by missing or invalid setup.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingDepreciationAccounts(_)
                | Self::MissingLineLabel { .. }
                | Self::IncompleteModel { .. }
                | Self::MissingGainLossAccount(_)
                | Self::MissingCounterpartAccount(_)
                | Self::MissingAssetAccount(_)
                | Self::NoExchangeRate { .. }
                | Self::Schedule(_)
        )
    }

    /// Returns true for errors raised by an illegal lifecycle transition.
    #[must_use]
    pub fn is_state_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAssetState { .. }
                | Self::ScheduleAlreadyGenerated(_)
                | Self::ScheduleDoesNotClose { .. }
                | Self::PostedEntriesAfterDisposal { .. }
                | Self::ProgressedAssetOnReset { .. }
                | Self::DepreciationResetNotAllowed(_)
                | Self::MoveNotDraft(_)
                | Self::MoveNotPosted(_)
                | Self::MoveAlreadyReversed(_)
                | Self::FutureAutoPost { .. }
                | Self::UnpostedEntriesBeforeDate { .. }
                | Self::ModificationBelowChildren { .. }
                | Self::NotEditableDepreciation { .. }
                | Self::InvalidSourceLines(_)
        )
    }

    /// Returns true for errors about missing or protected records.
    #[must_use]
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            Self::AssetNotFound(_)
                | Self::MoveNotFound(_)
                | Self::LineNotFound(_)
                | Self::CompanyNotFound(_)
                | Self::AccountNotFound(_)
                | Self::CannotDeleteAsset { .. }
                | Self::AssetHasPostedEntries(_)
        )
    }
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        let message = err.to_string();
        if err.is_configuration() {
            Self::Configuration(message)
        } else if err.is_state_violation() {
            Self::BusinessRule(message)
        } else if matches!(
            err,
            AssetError::CannotDeleteAsset { .. } | AssetError::AssetHasPostedEntries(_)
        ) {
            Self::Validation(message)
        } else if err.is_reference_error() {
            Self::NotFound(message)
        } else {
            Self::Internal(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AssetError::ScheduleAlreadyGenerated(AssetId::from_raw(1)).error_code(),
            "SCHEDULE_ALREADY_GENERATED"
        );
        assert_eq!(
            AssetError::UnbalancedMove {
                debit: dec!(10),
                credit: dec!(5),
            }
            .error_code(),
            "UNBALANCED_MOVE"
        );
        assert_eq!(
            AssetError::MissingLineLabel {
                account_code: "151000".to_string()
            }
            .error_code(),
            "MISSING_LINE_LABEL"
        );
    }

    #[test]
    fn test_error_display() {
        let err = AssetError::MissingLineLabel {
            account_code: "151000".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Journal items of 151000 should have a label in order to generate an asset"
        );

        let err = AssetError::ScheduleDoesNotClose {
            asset_id: AssetId::from_raw(4),
            remaining: dec!(1000),
        };
        assert_eq!(
            err.to_string(),
            "The remaining value on the last depreciation line of asset AST-4 must be 0, got 1000"
        );
    }

    #[test]
    fn test_categories_are_exclusive() {
        let samples = [
            AssetError::MissingDepreciationAccounts(AssetId::from_raw(1)),
            AssetError::MoveNotDraft(MoveId::from_raw(1)),
            AssetError::AssetNotFound(AssetId::from_raw(1)),
            AssetError::Internal("boom".to_string()),
        ];
        for err in &samples {
            let flags = [
                err.is_configuration(),
                err.is_state_violation(),
                err.is_reference_error(),
            ];
            assert!(flags.iter().filter(|f| **f).count() <= 1, "{err:?}");
        }
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = AssetError::MissingGainLossAccount(CompanyId::new()).into();
        assert_eq!(app.error_code(), "CONFIGURATION_ERROR");

        let app: AppError = AssetError::MoveAlreadyReversed(MoveId::from_raw(2)).into();
        assert_eq!(app.error_code(), "BUSINESS_RULE_VIOLATION");

        let app: AppError = AssetError::AssetNotFound(AssetId::from_raw(9)).into();
        assert_eq!(app.error_code(), "NOT_FOUND");

        let app: AppError = AssetError::CannotDeleteAsset {
            asset_id: AssetId::from_raw(9),
            state: AssetState::Open,
        }
        .into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");
    }
}
