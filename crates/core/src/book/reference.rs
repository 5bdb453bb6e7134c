//! Reference data the asset book posts against: companies and accounts.

use deprecia_shared::types::{AccountId, AssetId, CompanyId, Currency};
use serde::{Deserialize, Serialize};

use crate::asset::AssetType;
use crate::schedule::FiscalYearEnd;

/// Internal classification of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Fixed assets.
    FixedAsset,
    /// Non-current assets.
    NonCurrentAsset,
    /// Current assets.
    CurrentAsset,
    /// Prepayments.
    Prepayment,
    /// Current liabilities.
    CurrentLiability,
    /// Non-current liabilities.
    NonCurrentLiability,
    /// Income.
    Income,
    /// Expenses.
    Expense,
    /// Anything else.
    Other,
}

impl AccountKind {
    /// Asset type created by an account of this kind, if it can create any.
    #[must_use]
    pub const fn default_asset_type(self) -> Option<AssetType> {
        match self {
            Self::FixedAsset | Self::NonCurrentAsset => Some(AssetType::Purchase),
            Self::CurrentLiability | Self::NonCurrentLiability => Some(AssetType::Sale),
            Self::CurrentAsset | Self::Prepayment => Some(AssetType::Expense),
            Self::Income | Self::Expense | Self::Other => None,
        }
    }

    /// Returns true for accounts of the asset group.
    #[must_use]
    pub const fn is_asset_group(self) -> bool {
        matches!(
            self,
            Self::FixedAsset | Self::NonCurrentAsset | Self::CurrentAsset | Self::Prepayment
        )
    }
}

/// What posting an invoice line on the account does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateAssetMode {
    /// Nothing.
    #[default]
    No,
    /// Creates draft assets.
    Draft,
    /// Creates and validates assets.
    Validate,
}

/// Automatic asset creation settings of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAssetConfig {
    /// Type of the created assets.
    pub asset_type: AssetType,
    /// Creation mode.
    pub create_asset: CreateAssetMode,
    /// One asset per unit of quantity instead of one per line.
    pub multiple_assets_per_line: bool,
    /// Model applied to created assets.
    pub asset_model_id: Option<AssetId>,
}

/// An account of the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// Classification.
    pub kind: AccountKind,
    /// Automatic asset creation, for kinds that support it.
    pub auto_asset: Option<AutoAssetConfig>,
}

impl Account {
    /// Creates an account without automatic asset creation.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        company_id: CompanyId,
        kind: AccountKind,
    ) -> Self {
        Self {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
            company_id,
            kind,
            auto_asset: None,
        }
    }

    /// Enables automatic asset creation with the kind's default asset type.
    ///
    /// Kinds that cannot create assets are left unchanged.
    #[must_use]
    pub fn with_auto_asset(
        mut self,
        create_asset: CreateAssetMode,
        multiple_assets_per_line: bool,
        asset_model_id: Option<AssetId>,
    ) -> Self {
        if let Some(asset_type) = self.kind.default_asset_type() {
            self.auto_asset = Some(AutoAssetConfig {
                asset_type,
                create_asset,
                multiple_assets_per_line,
                asset_model_id,
            });
        }
        self
    }

    /// Returns the auto-create settings if posting on this account creates assets.
    #[must_use]
    pub fn creates_assets(&self) -> Option<&AutoAssetConfig> {
        self.auto_asset
            .as_ref()
            .filter(|c| c.create_asset != CreateAssetMode::No)
    }

    /// Returns true if this account creates one asset per unit.
    #[must_use]
    pub fn multiple_assets_per_line(&self) -> bool {
        self.auto_asset
            .as_ref()
            .is_some_and(|c| c.multiple_assets_per_line)
    }
}

/// A company owning assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Company ID.
    pub id: CompanyId,
    /// Company name.
    pub name: String,
    /// Currency of the books.
    pub currency: Currency,
    /// Account receiving disposal gains.
    pub gain_account_id: Option<AccountId>,
    /// Account receiving disposal losses.
    pub loss_account_id: Option<AccountId>,
    /// Last day of the fiscal year.
    pub fiscal_year_end: FiscalYearEnd,
}

impl Company {
    /// Creates a company with a calendar fiscal year and no gain/loss accounts.
    #[must_use]
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        Self {
            id: CompanyId::new(),
            name: name.into(),
            currency,
            gain_account_id: None,
            loss_account_id: None,
            fiscal_year_end: FiscalYearEnd::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccountKind::FixedAsset, Some(AssetType::Purchase))]
    #[case(AccountKind::NonCurrentAsset, Some(AssetType::Purchase))]
    #[case(AccountKind::CurrentLiability, Some(AssetType::Sale))]
    #[case(AccountKind::Prepayment, Some(AssetType::Expense))]
    #[case(AccountKind::Income, None)]
    fn test_default_asset_type(#[case] kind: AccountKind, #[case] expected: Option<AssetType>) {
        assert_eq!(kind.default_asset_type(), expected);
    }

    #[test]
    fn test_with_auto_asset() {
        let company = CompanyId::new();
        let account = Account::new("151000", "Fixed Asset", company, AccountKind::FixedAsset)
            .with_auto_asset(CreateAssetMode::Draft, true, None);
        let config = account.creates_assets().unwrap();
        assert_eq!(config.asset_type, AssetType::Purchase);
        assert!(account.multiple_assets_per_line());

        let income = Account::new("400000", "Product Sales", company, AccountKind::Income)
            .with_auto_asset(CreateAssetMode::Draft, false, None);
        assert!(income.creates_assets().is_none());
    }

    #[test]
    fn test_mode_no_does_not_create() {
        let account = Account::new("151000", "Fixed Asset", CompanyId::new(), AccountKind::FixedAsset)
            .with_auto_asset(CreateAssetMode::No, false, None);
        assert!(account.auto_asset.is_some());
        assert!(account.creates_assets().is_none());
    }
}
