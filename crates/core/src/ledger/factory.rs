//! Builds the ledger entries of the asset engine.
//!
//! Every entry built here balances. Amounts are given in asset currency and
//! converted to company currency with the rate carried by [`PostingContext`].

use chrono::NaiveDate;
use deprecia_shared::types::{AccountId, Currency, PartnerId};
use rust_decimal::Decimal;

use super::entry::{Move, MoveInput, MoveKind, MoveLineInput, MoveType};
use crate::asset::{Asset, AssetError, AssetType};
use crate::currency::CurrencyService;
use crate::schedule::Installment;

/// Accounts debited and credited by a depreciation entry.
///
/// Resolved once from the asset type: fixed assets and deferred expenses debit
/// the expense account and credit the accumulated depreciation account,
/// deferred revenue does the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingRule {
    /// Account receiving the debit.
    pub debit_account: AccountId,
    /// Account receiving the credit.
    pub credit_account: AccountId,
}

impl PostingRule {
    /// Resolves the posting rule of an asset.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MissingDepreciationAccounts` if either account is unset.
    pub fn for_asset(asset: &Asset) -> Result<Self, AssetError> {
        let (Some(depreciation), Some(expense)) =
            (asset.accounts.depreciation, asset.accounts.depreciation_expense)
        else {
            return Err(AssetError::MissingDepreciationAccounts(asset.id));
        };
        Ok(match asset.asset_type {
            AssetType::Purchase | AssetType::Expense => Self {
                debit_account: expense,
                credit_account: depreciation,
            },
            AssetType::Sale => Self {
                debit_account: depreciation,
                credit_account: expense,
            },
        })
    }
}

/// Company-level data needed to turn asset amounts into ledger lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingContext {
    /// Currency of the company books.
    pub company_currency: Currency,
    /// Rate from asset currency to company currency at the entry date.
    pub rate: Decimal,
    /// Partner of the source document, when there is exactly one.
    pub partner_id: Option<PartnerId>,
    /// The asset was created from a credit note.
    pub refund_origin: bool,
}

impl PostingContext {
    /// Context for an asset booked in the company currency.
    #[must_use]
    pub fn same_currency(company_currency: Currency) -> Self {
        Self {
            company_currency,
            rate: Decimal::ONE,
            partner_id: None,
            refund_origin: false,
        }
    }

    /// Converts an asset-currency amount to company currency.
    #[must_use]
    pub fn to_company(&self, amount: Decimal) -> Decimal {
        CurrencyService::convert(amount, self.rate, self.company_currency)
    }
}

/// Values of one asset entry before it becomes ledger lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Kind of entry.
    pub kind: MoveKind,
    /// Reference text.
    pub reference: String,
    /// Accounting date.
    pub date: NaiveDate,
    /// Depreciation amount in asset currency.
    pub amount: Decimal,
    /// Residual value after the entry.
    pub remaining_value: Decimal,
    /// Cumulative depreciation after the entry.
    pub depreciated_value: Decimal,
    /// Posted automatically once its date is reached.
    pub auto_post: bool,
}

/// Values needed to build a disposal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposalValues {
    /// Account the gross value is taken off.
    pub asset_account: AccountId,
    /// Posted depreciation plus imported depreciation, in asset currency.
    pub depreciated: Decimal,
    /// Sale lines `(account, subtotal)`, in company currency.
    pub proceeds: Vec<(AccountId, Decimal)>,
    /// Company gain account.
    pub gain_account: Option<AccountId>,
    /// Company loss account.
    pub loss_account: Option<AccountId>,
}

/// Stateless factory for asset ledger entries.
pub struct EntryFactory;

impl EntryFactory {
    /// Builds the two balanced lines of a depreciation entry.
    ///
    /// `amount` is in asset currency, `company_amount` the same amount in
    /// company currency. Assets created from a credit note book the opposite
    /// sides.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MissingDepreciationAccounts` if the asset has no
    /// depreciation or expense account.
    pub fn depreciation_lines(
        asset: &Asset,
        amount: Decimal,
        company_amount: Decimal,
        ctx: &PostingContext,
    ) -> Result<Vec<MoveLineInput>, AssetError> {
        let rule = PostingRule::for_asset(asset)?;
        let (amount, company_amount) = if ctx.refund_origin {
            (-amount, -company_amount)
        } else {
            (amount, company_amount)
        };

        let line = |account_id, balance, amount_currency| MoveLineInput {
            partner_id: ctx.partner_id,
            ..MoveLineInput::from_balance(
                account_id,
                Some(asset.name.clone()),
                balance,
                amount_currency,
                asset.currency,
            )
        };
        Ok(vec![
            line(rule.credit_account, -company_amount, -amount),
            line(rule.debit_account, company_amount, amount),
        ])
    }

    /// Builds a depreciation (or value decrease) entry of an asset.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MissingDepreciationAccounts` if the asset has no
    /// depreciation or expense account.
    pub fn depreciation_move(
        asset: &Asset,
        entry: &AssetEntry,
        ctx: &PostingContext,
    ) -> Result<MoveInput, AssetError> {
        let lines = Self::depreciation_lines(asset, entry.amount, ctx.to_company(entry.amount), ctx)?;
        Ok(MoveInput {
            reference: entry.reference.clone(),
            journal_id: asset.journal_id,
            partner_id: ctx.partner_id,
            asset_id: Some(asset.id),
            amount_total: entry.amount,
            asset_remaining_value: entry.remaining_value,
            asset_depreciated_value: entry.depreciated_value,
            auto_post: entry.auto_post,
            lines,
            ..MoveInput::new(
                entry.kind,
                MoveType::Entry,
                asset.company_id,
                entry.date,
                asset.currency,
            )
        })
    }

    /// Turns a schedule installment into an entry.
    ///
    /// `offset` is the number of periods booked before the schedule started
    /// (imported and posted), so references keep counting across regenerations.
    #[must_use]
    pub fn installment_entry(asset: &Asset, installment: &Installment, offset: u32) -> AssetEntry {
        let reference = if installment.prorata {
            format!("{} (prorata entry)", asset.name)
        } else {
            format!(
                "{} ({}/{})",
                asset.name,
                installment.number + offset,
                asset.terms.method_number
            )
        };
        AssetEntry {
            kind: MoveKind::Depreciation,
            reference,
            date: installment.date,
            amount: installment.amount,
            remaining_value: installment.remaining_value,
            depreciated_value: installment.depreciated_value,
            auto_post: true,
        }
    }

    /// Builds the lines of a disposal entry.
    ///
    /// Lines, in order: gross value taken off the asset account, accumulated
    /// depreciation (kept even when zero), one line per sale line, and the
    /// gain or loss difference when non-zero.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MissingDepreciationAccounts` without a depreciation
    /// account and `AssetError::MissingGainLossAccount` when a difference has no
    /// account to go to.
    pub fn disposal_lines(
        asset: &Asset,
        values: &DisposalValues,
        ctx: &PostingContext,
    ) -> Result<Vec<MoveLineInput>, AssetError> {
        let depreciation_account = asset
            .accounts
            .depreciation
            .ok_or(AssetError::MissingDepreciationAccounts(asset.id))?;
        let sign = match asset.asset_type {
            AssetType::Sale => Decimal::NEGATIVE_ONE,
            AssetType::Purchase | AssetType::Expense => Decimal::ONE,
        };

        // Positive amounts are credits.
        let initial = sign * asset.original_value;
        let depreciated = -sign * values.depreciated.abs();
        let label = Some(asset.name.clone());
        let company = ctx.company_currency;

        let mut lines = vec![
            MoveLineInput::from_balance(
                values.asset_account,
                label.clone(),
                -ctx.to_company(initial),
                -initial,
                asset.currency,
            ),
            MoveLineInput::from_balance(
                depreciation_account,
                label.clone(),
                -ctx.to_company(depreciated),
                -depreciated,
                asset.currency,
            ),
        ];
        let mut total = ctx.to_company(initial) + ctx.to_company(depreciated);
        for (account_id, subtotal) in &values.proceeds {
            let proceeds = -sign * subtotal.abs();
            total += proceeds;
            lines.push(MoveLineInput::from_balance(
                *account_id,
                label.clone(),
                -proceeds,
                -proceeds,
                company,
            ));
        }

        let difference = -total;
        if !company.is_zero(difference) {
            let account = if difference > Decimal::ZERO {
                values.gain_account
            } else {
                values.loss_account
            }
            .ok_or(AssetError::MissingGainLossAccount(asset.company_id))?;
            lines.push(MoveLineInput::from_balance(
                account,
                label,
                -difference,
                -difference,
                company,
            ));
        }
        Ok(lines)
    }

    /// Builds the journal entry of a value increase.
    ///
    /// Debits the asset account and credits the counterpart account by `amount`.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MissingAssetAccount` if the asset has no asset account.
    pub fn value_increase_move(
        asset: &Asset,
        counterpart_account: AccountId,
        amount: Decimal,
        date: NaiveDate,
        reference: String,
        ctx: &PostingContext,
    ) -> Result<MoveInput, AssetError> {
        let asset_account = asset
            .accounts
            .asset
            .ok_or(AssetError::MissingAssetAccount(asset.id))?;
        let company_amount = ctx.to_company(amount);
        let label = Some(asset.name.clone());
        Ok(MoveInput {
            reference,
            journal_id: asset.journal_id,
            lines: vec![
                MoveLineInput::from_balance(asset_account, label.clone(), company_amount, amount, asset.currency),
                MoveLineInput::from_balance(
                    counterpart_account,
                    label,
                    -company_amount,
                    -amount,
                    asset.currency,
                ),
            ],
            ..MoveInput::new(
                MoveKind::ValueIncrease,
                MoveType::Entry,
                asset.company_id,
                date,
                asset.currency,
            )
        })
    }

    /// Builds the mirror of a posted entry: every debit becomes a credit and
    /// every credit a debit.
    #[must_use]
    pub fn reversal_move(original: &Move, date: NaiveDate) -> MoveInput {
        let move_type = match original.move_type {
            MoveType::Entry => MoveType::Entry,
            MoveType::InInvoice => MoveType::InRefund,
            MoveType::OutInvoice => MoveType::OutRefund,
            MoveType::InRefund => MoveType::InInvoice,
            MoveType::OutRefund => MoveType::OutInvoice,
        };
        let lines = original
            .lines
            .iter()
            .map(|line| MoveLineInput {
                account_id: line.account_id,
                name: line.name.clone(),
                debit: line.credit,
                credit: line.debit,
                amount_currency: -line.amount_currency,
                currency: line.currency,
                partner_id: line.partner_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price_unit: line.price_unit,
                price_subtotal: line.price_subtotal,
                price_total: line.price_total,
                tax_line: line.tax_line,
                exclude_from_invoice_tab: line.exclude_from_invoice_tab,
            })
            .collect();

        MoveInput {
            reference: format!("Reversal of: {}", original.reference),
            journal_id: original.journal_id,
            partner_id: original.partner_id,
            amount_total: original.amount_total,
            reversed_entry_id: Some(original.id),
            lines,
            ..MoveInput::new(
                MoveKind::Reversal,
                move_type,
                original.company_id,
                date,
                original.currency,
            )
        }
    }
}
