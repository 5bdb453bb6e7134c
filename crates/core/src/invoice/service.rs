//! Assets created from posted invoices, and removed again by credit notes.

use std::collections::HashMap;

use deprecia_shared::types::{AssetId, Currency, ProductId};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::asset::{AssetError, CreateAssetInput};
use crate::book::reference::{Account, AutoAssetConfig, CreateAssetMode};
use crate::ledger::{Move, MoveLine};

/// Assets to create for one invoice line.
#[derive(Debug, Clone)]
pub struct AutoAssetPlan {
    /// One input per asset.
    pub inputs: Vec<CreateAssetInput>,
    /// Validate the assets once created.
    pub validate: bool,
}

/// Key matching credit note lines to the invoice lines they credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseKey {
    /// Product.
    pub product_id: Option<ProductId>,
    /// Unit price.
    pub price_unit: Decimal,
    /// Quantity.
    pub quantity: Decimal,
}

impl ReverseKey {
    /// Key of a ledger line.
    #[must_use]
    pub fn of(line: &MoveLine) -> Self {
        Self {
            product_id: line.product_id,
            price_unit: line.price_unit,
            quantity: line.quantity,
        }
    }
}

/// An asset created from a credited invoice line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedAsset {
    /// The asset.
    pub asset_id: AssetId,
    /// Draft, or every entry of its board still draft.
    pub deletable: bool,
}

/// A line of the credited invoice with the assets it created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedLine {
    /// Matching key of the line.
    pub key: ReverseKey,
    /// The line's account creates one asset per unit.
    pub multiple_assets_per_line: bool,
    /// Assets created from the line.
    pub assets: Vec<LinkedAsset>,
}

/// Stateless invoice posting hook.
pub struct InvoiceService;

impl InvoiceService {
    /// Returns the auto-create settings applying to `line`, if it creates assets.
    ///
    /// Lines of customer documents on asset accounts, credit notes of a
    /// specific invoice, tax lines, lines with a non-positive total and lines
    /// that already created assets are skipped.
    #[must_use]
    pub fn eligible_config<'a>(
        entry: &Move,
        line: &MoveLine,
        account: &'a Account,
        already_linked: bool,
    ) -> Option<&'a AutoAssetConfig> {
        if !entry.move_type.is_invoice()
            || (entry.move_type.is_customer_document() && account.kind.is_asset_group())
            || entry.reversed_entry_id.is_some()
            || line.tax_line
            || already_linked
            || line.currency.is_zero(line.price_total)
            || line.price_total <= Decimal::ZERO
        {
            return None;
        }
        account.creates_assets()
    }

    /// Plans the assets created by an eligible line.
    ///
    /// Accounts creating one asset per unit create `max(1, ⌊quantity⌋)` assets
    /// named `"<label> (i of n)"`, sharing the line balance equally.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MissingLineLabel` if the line has no label.
    pub fn plan_assets(
        entry: &Move,
        line: &MoveLine,
        account: &Account,
        config: &AutoAssetConfig,
        company_currency: Currency,
    ) -> Result<AutoAssetPlan, AssetError> {
        let label = line
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AssetError::MissingLineLabel {
                account_code: account.code.clone(),
            })?;

        let units: u32 = if config.multiple_assets_per_line {
            line.quantity.trunc().to_u32().unwrap_or(0).max(1)
        } else {
            1
        };
        let value = company_currency.round(line.balance().abs() / Decimal::from(units));

        let inputs = (1..=units)
            .map(|i| {
                let name = if units > 1 {
                    format!("{label} ({i} of {units})")
                } else {
                    label.to_string()
                };
                let mut input = CreateAssetInput::new(
                    name,
                    config.asset_type,
                    entry.company_id,
                    value,
                    entry.date,
                );
                input.currency = Some(company_currency);
                input.accounts.asset = Some(line.account_id);
                input.model_id = config.asset_model_id;
                input.original_move_line_ids = vec![line.id];
                input
            })
            .collect();

        Ok(AutoAssetPlan {
            inputs,
            validate: config.asset_model_id.is_some() && config.create_asset == CreateAssetMode::Validate,
        })
    }

    /// Picks the assets a credit note removes.
    ///
    /// `credited` are the keys of the credit note's invoice lines. A line that
    /// created a single asset is matched on product, unit price and quantity;
    /// each match consumes one credited key. Lines that created one asset per
    /// unit are then matched on product and unit price, removing one asset per
    /// credited unit left. Only deletable assets are picked.
    #[must_use]
    pub fn assets_to_delete(credited: &[ReverseKey], linked: &[LinkedLine]) -> Vec<AssetId> {
        let mut remaining: Vec<ReverseKey> = credited.to_vec();
        let mut deleted = Vec::new();

        for line in linked.iter().filter(|l| !l.multiple_assets_per_line && !l.assets.is_empty()) {
            let Some(index) = remaining.iter().position(|k| *k == line.key) else {
                continue;
            };
            deleted.extend(line.assets.iter().filter(|a| a.deletable).map(|a| a.asset_id));
            remaining.remove(index);
        }

        let mut counts: HashMap<(Option<ProductId>, Decimal), Decimal> = HashMap::new();
        for key in &remaining {
            *counts.entry((key.product_id, key.price_unit)).or_default() += key.quantity;
        }
        for line in linked.iter().filter(|l| l.multiple_assets_per_line) {
            let Some(count) = counts.get_mut(&(line.key.product_id, line.key.price_unit)) else {
                continue;
            };
            for asset in &line.assets {
                if *count > Decimal::ZERO && asset.deletable {
                    deleted.push(asset.asset_id);
                    *count -= Decimal::ONE;
                }
            }
        }
        deleted
    }
}
