//! Asset domain types.

use chrono::NaiveDate;
use deprecia_shared::types::{
    AccountId, AssetId, CompanyId, Currency, JournalId, MoveLineId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What an asset record tracks.
///
/// The variant decides which accounts a depreciation entry debits and credits,
/// see [`crate::ledger::PostingRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    /// A depreciable fixed asset.
    Purchase,
    /// Deferred revenue recognised over time.
    Sale,
    /// Deferred (prepaid) expense recognised over time.
    Expense,
}

impl AssetType {
    /// Deferred revenue and expense close on their own once fully recognised.
    /// Fixed assets need an explicit disposal.
    #[must_use]
    pub const fn closes_automatically(self) -> bool {
        matches!(self, Self::Sale | Self::Expense)
    }

    /// Returns the lowercase name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored state of an asset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetState {
    /// Template whose terms are copied onto new assets.
    Model,
    /// Being prepared, no schedule yet.
    Draft,
    /// Validated, schedule generated.
    Open,
    /// Fully depreciated or disposed.
    Close,
}

impl AssetState {
    /// Returns the lowercase name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

impl std::fmt::Display for AssetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle stage derived from the stored state and the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStage {
    /// Not validated yet.
    Draft,
    /// Validated with draft entries still waiting to be posted.
    Open,
    /// Validated and every generated entry is posted.
    Running,
    /// Closed.
    Close,
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Running => "running",
            Self::Close => "close",
        })
    }
}

/// Depreciation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationMethod {
    /// Equal installments.
    Linear,
    /// Fixed percentage of the remaining value.
    Declining,
    /// Declining until straight-line over the remaining periods is larger.
    DecliningThenLinear,
}

impl DepreciationMethod {
    /// Label used in the depreciation table.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::Declining => "Declining",
            Self::DecliningThenLinear => "Dec. then Straight",
        }
    }
}

/// Length of one depreciation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodPeriod {
    /// One month; dates land on month ends.
    Monthly,
    /// Twelve months; dates land on the fiscal year end.
    Yearly,
}

impl MethodPeriod {
    /// Number of months in one period.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Yearly => 12,
        }
    }
}

/// The depreciation terms copied from models and changed by value modifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationTerms {
    /// Depreciation method.
    pub method: DepreciationMethod,
    /// Number of periods over which the asset depreciates.
    pub method_number: u32,
    /// Length of one period.
    pub method_period: MethodPeriod,
    /// Declining rate, between 0 (exclusive) and 1 (inclusive).
    pub progress_factor: Decimal,
    /// Whether the first period is pro-rated.
    pub prorata: bool,
    /// Start of the pro-rated first period; defaults to the acquisition date.
    pub prorata_date: Option<NaiveDate>,
}

impl Default for DepreciationTerms {
    fn default() -> Self {
        Self {
            method: DepreciationMethod::Linear,
            method_number: 5,
            method_period: MethodPeriod::Yearly,
            progress_factor: Decimal::new(3, 1),
            prorata: false,
            prorata_date: None,
        }
    }
}

/// Accounts an asset posts to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAccounts {
    /// Account holding the gross asset value (or the deferred balance).
    pub asset: Option<AccountId>,
    /// Accumulated depreciation account.
    pub depreciation: Option<AccountId>,
    /// Depreciation expense account (revenue account for deferred revenue).
    pub depreciation_expense: Option<AccountId>,
}

/// A depreciable item, deferred revenue or deferred expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset ID.
    pub id: AssetId,
    /// Display name.
    pub name: String,
    /// What the asset tracks.
    pub asset_type: AssetType,
    /// Stored state.
    pub state: AssetState,
    /// Archived assets are ignored by reports.
    pub active: bool,
    /// Owning company.
    pub company_id: CompanyId,
    /// Currency the values below are expressed in.
    pub currency: Currency,
    /// Journal the entries are booked in.
    pub journal_id: Option<JournalId>,
    /// Gross value.
    pub original_value: Decimal,
    /// Value that is never depreciated.
    pub salvage_value: Decimal,
    /// Depreciation booked before the asset was tracked here.
    pub already_depreciated_amount_import: Decimal,
    /// Number of periods covered by the imported depreciation.
    pub depreciation_number_import: u32,
    /// First depreciation date of the imported history.
    pub first_depreciation_date_import: Option<NaiveDate>,
    /// Acquisition date.
    pub acquisition_date: NaiveDate,
    /// Date of the first installment; computed from the acquisition date when unset.
    pub first_depreciation_date: Option<NaiveDate>,
    /// Date the disposal entry was posted.
    pub disposal_date: Option<NaiveDate>,
    /// Depreciation terms.
    pub terms: DepreciationTerms,
    /// Posting accounts.
    pub accounts: AssetAccounts,
    /// Asset this one was split from by a value increase.
    pub parent_id: Option<AssetId>,
    /// Model the terms were copied from.
    pub model_id: Option<AssetId>,
    /// Source ledger lines that created this asset.
    pub original_move_line_ids: Vec<MoveLineId>,
}

impl Asset {
    /// Depreciable base before imports: original value minus salvage value.
    #[must_use]
    pub fn depreciable_base(&self) -> Decimal {
        self.original_value - self.salvage_value
    }

    /// Residual before any entry of this book: base minus imported depreciation.
    #[must_use]
    pub fn opening_residual(&self) -> Decimal {
        self.depreciable_base() - self.already_depreciated_amount_import
    }

    /// Date the pro-rated first period starts.
    #[must_use]
    pub fn prorata_start(&self) -> NaiveDate {
        self.terms.prorata_date.unwrap_or(self.acquisition_date)
    }

    /// Returns true if the asset is a template.
    #[must_use]
    pub fn is_model(&self) -> bool {
        self.state == AssetState::Model
    }

    /// Returns true if the asset can still be edited freely.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.state == AssetState::Draft
    }
}

/// Input for creating an asset or an asset model.
#[derive(Debug, Clone)]
pub struct CreateAssetInput {
    /// Display name.
    pub name: String,
    /// What the asset tracks.
    pub asset_type: AssetType,
    /// Owning company.
    pub company_id: CompanyId,
    /// Asset currency; the company currency when unset.
    pub currency: Option<Currency>,
    /// Journal the entries are booked in.
    pub journal_id: Option<JournalId>,
    /// Gross value.
    pub original_value: Decimal,
    /// Value that is never depreciated.
    pub salvage_value: Decimal,
    /// Depreciation booked before the asset was tracked here.
    pub already_depreciated_amount_import: Decimal,
    /// Number of periods covered by the imported depreciation.
    pub depreciation_number_import: u32,
    /// First depreciation date of the imported history.
    pub first_depreciation_date_import: Option<NaiveDate>,
    /// Acquisition date.
    pub acquisition_date: NaiveDate,
    /// Explicit first depreciation date.
    pub first_depreciation_date: Option<NaiveDate>,
    /// Depreciation terms.
    pub terms: DepreciationTerms,
    /// Posting accounts.
    pub accounts: AssetAccounts,
    /// Model to copy terms and accounts from.
    pub model_id: Option<AssetId>,
    /// Source ledger lines.
    pub original_move_line_ids: Vec<MoveLineId>,
}

impl CreateAssetInput {
    /// Creates an input with default terms and no accounts.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        asset_type: AssetType,
        company_id: CompanyId,
        original_value: Decimal,
        acquisition_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            asset_type,
            company_id,
            currency: None,
            journal_id: None,
            original_value,
            salvage_value: Decimal::ZERO,
            already_depreciated_amount_import: Decimal::ZERO,
            depreciation_number_import: 0,
            first_depreciation_date_import: None,
            acquisition_date,
            first_depreciation_date: None,
            terms: DepreciationTerms::default(),
            accounts: AssetAccounts::default(),
            model_id: None,
            original_move_line_ids: Vec::new(),
        }
    }
}

/// Residual, salvage and book value summed over an asset and its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyTotals {
    /// Sum of `value_residual`.
    pub value_residual: Decimal,
    /// Sum of `salvage_value`.
    pub salvage_value: Decimal,
    /// Sum of `book_value`.
    pub book_value: Decimal,
}
