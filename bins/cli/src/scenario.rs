//! Scenario files: a company, its accounts and rates, and the assets to run.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use deprecia_core::asset::{AssetType, CreateAssetInput, DepreciationMethod, DepreciationTerms, MethodPeriod};
use deprecia_core::book::{Account, AccountKind, AssetBook, Company};
use deprecia_core::currency::ExchangeRate;
use deprecia_core::report::ReportOptions;
use deprecia_core::schedule::FiscalYearEnd;
use deprecia_shared::{AppError, AppResult, EngineConfig};
use deprecia_shared::types::{AccountId, AssetId, Currency};
use rust_decimal::Decimal;
use serde::Deserialize;

/// A scenario as read from JSON.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Date the scenario runs on; the system date when unset.
    pub today: Option<NaiveDate>,
    /// The company.
    pub company: CompanySpec,
    /// Chart of accounts.
    pub accounts: Vec<AccountSpec>,
    /// Exchange rates.
    #[serde(default)]
    pub rates: Vec<RateSpec>,
    /// Assets to create and validate.
    pub assets: Vec<AssetSpec>,
    /// Range of the depreciation table.
    pub report: ReportSpec,
}

/// Company settings.
#[derive(Debug, Deserialize)]
pub struct CompanySpec {
    /// Company name.
    pub name: String,
    /// Currency of the books; the configured default when unset.
    pub currency: Option<Currency>,
    /// Code of the account receiving disposal gains.
    pub gain_account: Option<String>,
    /// Code of the account receiving disposal losses.
    pub loss_account: Option<String>,
}

/// One account.
#[derive(Debug, Deserialize)]
pub struct AccountSpec {
    /// Account code, used to refer to the account in the scenario.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account kind.
    pub kind: AccountKind,
}

/// One exchange rate.
#[derive(Debug, Deserialize)]
pub struct RateSpec {
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
    /// 1 `from` = `rate` `to`.
    pub rate: Decimal,
    /// Effective date.
    pub date: NaiveDate,
}

/// One asset.
#[derive(Debug, Deserialize)]
pub struct AssetSpec {
    pub name: String,
    #[serde(default = "default_asset_type")]
    pub asset_type: AssetType,
    pub currency: Option<Currency>,
    pub original_value: Decimal,
    #[serde(default)]
    pub salvage_value: Decimal,
    pub acquisition_date: NaiveDate,
    #[serde(default)]
    pub already_depreciated_amount_import: Decimal,
    #[serde(default)]
    pub depreciation_number_import: u32,
    #[serde(default = "default_method")]
    pub method: DepreciationMethod,
    pub method_number: u32,
    #[serde(default = "default_method_period")]
    pub method_period: MethodPeriod,
    pub progress_factor: Option<Decimal>,
    #[serde(default)]
    pub prorata: bool,
    pub asset_account: Option<String>,
    pub depreciation_account: String,
    pub expense_account: String,
}

fn default_asset_type() -> AssetType {
    AssetType::Purchase
}

fn default_method() -> DepreciationMethod {
    DepreciationMethod::Linear
}

fn default_method_period() -> MethodPeriod {
    MethodPeriod::Yearly
}

/// Range of the depreciation table.
#[derive(Debug, Deserialize)]
pub struct ReportSpec {
    /// First day of the range.
    pub date_from: NaiveDate,
    /// Last day of the range.
    pub date_to: NaiveDate,
    /// Include draft entries.
    #[serde(default)]
    pub all_entries: bool,
}

impl ReportSpec {
    /// Report options for the scenario's range.
    pub fn options(&self) -> ReportOptions {
        ReportOptions::new(self.date_from, self.date_to).with_all_entries(self.all_entries)
    }
}

impl Scenario {
    /// Reads a scenario file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Input(format!("failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| AppError::Input(format!("failed to parse {}: {e}", path.display())))
    }

    /// Builds an asset book holding the scenario's records, assets left in draft.
    pub fn build(&self, engine: &EngineConfig) -> anyhow::Result<(AssetBook, Vec<AssetId>)> {
        let mut book = AssetBook::new();
        book.set_today(self.today);

        let mut company = Company::new(
            self.company.name.clone(),
            self.company.currency.unwrap_or(engine.company_currency),
        );
        company.fiscal_year_end = FiscalYearEnd::new(engine.fiscal_year_last_month, engine.fiscal_year_last_day);
        let company_id = company.id;

        let mut accounts: HashMap<&str, AccountId> = HashMap::new();
        for spec in &self.accounts {
            let id = book.add_account(Account::new(spec.code.clone(), spec.name.clone(), company_id, spec.kind));
            if accounts.insert(spec.code.as_str(), id).is_some() {
                return Err(AppError::Input(format!("account {} is defined twice", spec.code)).into());
            }
        }
        let lookup = |code: &str| {
            accounts
                .get(code)
                .copied()
                .ok_or_else(|| AppError::Input(format!("unknown account {code}")))
        };

        company.gain_account_id = self.company.gain_account.as_deref().map(lookup).transpose()?;
        company.loss_account_id = self.company.loss_account.as_deref().map(lookup).transpose()?;
        book.add_company(company);

        for rate in &self.rates {
            book.add_rate(ExchangeRate::new(rate.from, rate.to, rate.rate, rate.date));
        }

        let mut ids = Vec::with_capacity(self.assets.len());
        for spec in &self.assets {
            let mut input = CreateAssetInput::new(
                spec.name.clone(),
                spec.asset_type,
                company_id,
                spec.original_value,
                spec.acquisition_date,
            );
            input.currency = spec.currency;
            input.salvage_value = spec.salvage_value;
            input.already_depreciated_amount_import = spec.already_depreciated_amount_import;
            input.depreciation_number_import = spec.depreciation_number_import;
            input.terms = DepreciationTerms {
                method: spec.method,
                method_number: spec.method_number,
                method_period: spec.method_period,
                prorata: spec.prorata,
                ..DepreciationTerms::default()
            };
            if let Some(factor) = spec.progress_factor {
                input.terms.progress_factor = factor;
            }
            input.accounts.asset = spec.asset_account.as_deref().map(lookup).transpose()?;
            input.accounts.depreciation = Some(lookup(&spec.depreciation_account)?);
            input.accounts.depreciation_expense = Some(lookup(&spec.expense_account)?);

            let id = book
                .create_asset(input)
                .map_err(AppError::from)
                .with_context(|| format!("failed to create asset {}", spec.name))?;
            ids.push(id);
        }
        Ok((book, ids))
    }
}
