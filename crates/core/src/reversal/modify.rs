//! Value modification of an open asset.
//!
//! A modification asks for a new residual value and a new salvage value. What
//! the asset's book value can absorb stays on the asset (a decrease is booked
//! as a value decrease entry); the excess is split off into a child asset.
//!
//! Split policy, with `book = residual + salvage`:
//!
//! ```text
//! parent_residual = min(book - min(requested_salvage, salvage), requested_residual)
//! parent_salvage  = min(book - parent_residual, requested_salvage)
//! child residual  = max(0, requested_residual - parent_residual)
//! child salvage   = max(0, requested_salvage - parent_salvage)
//! decrease        = max(0, book - requested_residual - requested_salvage)
//! ```
//!
//! The parent keeps as much residual as its book value allows; salvage is
//! only reduced when the residual needs the room. The whole increase goes to
//! the child, so parent and child together hold exactly the requested values.

use chrono::NaiveDate;
use deprecia_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::asset::{DepreciationMethod, MethodPeriod};

/// A value modification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyRequest {
    /// Date of the modification.
    pub date: NaiveDate,
    /// Reason, used in entry references and the child name.
    pub reason: String,
    /// Requested residual value of the asset family.
    pub value_residual: Decimal,
    /// Requested salvage value of the asset family.
    pub salvage_value: Decimal,
    /// New total number of periods.
    pub method_number: u32,
    /// New period length.
    pub method_period: MethodPeriod,
    /// New method; unchanged when unset.
    pub method: Option<DepreciationMethod>,
    /// Account credited by a value increase.
    pub counterpart_account_id: Option<AccountId>,
}

/// How a modification is split between the asset and a new child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyPlan {
    /// Residual value kept on the asset.
    pub parent_residual: Decimal,
    /// Salvage value kept on the asset.
    pub parent_salvage: Decimal,
    /// Value decrease booked on the asset.
    pub decrease: Decimal,
    /// Residual value of the child.
    pub residual_increase: Decimal,
    /// Salvage value of the child.
    pub salvage_increase: Decimal,
}

impl ModifyPlan {
    /// Gross value of the child asset, zero when no child is needed.
    #[must_use]
    pub fn increase(&self) -> Decimal {
        self.residual_increase + self.salvage_increase
    }

    /// Returns true if a child asset must be created.
    #[must_use]
    pub fn needs_child(&self) -> bool {
        self.increase() > Decimal::ZERO
    }
}

/// Stateless modification planner.
pub struct ModifyService;

impl ModifyService {
    /// Splits the requested values between the asset and a child.
    ///
    /// `residual` and `salvage` are the asset's current values.
    #[must_use]
    pub fn plan(
        residual: Decimal,
        salvage: Decimal,
        requested_residual: Decimal,
        requested_salvage: Decimal,
    ) -> ModifyPlan {
        let book = residual + salvage;
        let parent_residual = (book - requested_salvage.min(salvage)).min(requested_residual);
        let parent_salvage = (book - parent_residual).min(requested_salvage);
        ModifyPlan {
            parent_residual,
            parent_salvage,
            decrease: (book - requested_residual - requested_salvage).max(Decimal::ZERO),
            residual_increase: (requested_residual - parent_residual).max(Decimal::ZERO),
            salvage_increase: (requested_salvage - parent_salvage).max(Decimal::ZERO),
        }
    }
}
