//! Ledger entry ("move") domain types.

use chrono::NaiveDate;
use deprecia_shared::types::{
    AccountId, AssetId, CompanyId, Currency, JournalId, MoveId, MoveLineId, PartnerId, ProductId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Posting state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveState {
    /// Editable, not part of the books yet.
    Draft,
    /// Booked; only a reversal can undo it.
    Posted,
    /// Cancelled.
    Cancel,
}

impl MoveState {
    /// Returns the lowercase name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Posted => "posted",
            Self::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for MoveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document type of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    /// Miscellaneous journal entry.
    Entry,
    /// Vendor bill.
    InInvoice,
    /// Customer invoice.
    OutInvoice,
    /// Vendor credit note.
    InRefund,
    /// Customer credit note.
    OutRefund,
}

impl MoveType {
    /// Returns true for invoices and credit notes.
    #[must_use]
    pub const fn is_invoice(self) -> bool {
        !matches!(self, Self::Entry)
    }

    /// Returns true for credit notes.
    #[must_use]
    pub const fn is_refund(self) -> bool {
        matches!(self, Self::InRefund | Self::OutRefund)
    }

    /// Returns true for customer documents.
    #[must_use]
    pub const fn is_customer_document(self) -> bool {
        matches!(self, Self::OutInvoice | Self::OutRefund)
    }
}

/// What produced a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Scheduled depreciation installment.
    Depreciation,
    /// Value decrease booked by a value modification.
    ValueDecrease,
    /// Value increase booked by a value modification (source of the child asset).
    ValueIncrease,
    /// Disposal or sale of an asset.
    Disposal,
    /// Mirror of a reversed entry.
    Reversal,
    /// Invoice or credit note.
    Invoice,
    /// Any other journal entry.
    Journal,
}

impl MoveKind {
    /// Returns true for entries flagged as asset value changes.
    #[must_use]
    pub const fn is_value_change(self) -> bool {
        matches!(self, Self::ValueDecrease)
    }
}

/// A single line of a ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveLine {
    /// Line ID.
    pub id: MoveLineId,
    /// The entry this line belongs to.
    pub move_id: MoveId,
    /// Account posted to.
    pub account_id: AccountId,
    /// Label.
    pub name: Option<String>,
    /// Debit in company currency.
    pub debit: Decimal,
    /// Credit in company currency.
    pub credit: Decimal,
    /// Signed amount in the line currency.
    pub amount_currency: Decimal,
    /// Line currency.
    pub currency: Currency,
    /// Partner.
    pub partner_id: Option<PartnerId>,
    /// Product sold or bought.
    pub product_id: Option<ProductId>,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit price.
    pub price_unit: Decimal,
    /// Total without taxes.
    pub price_subtotal: Decimal,
    /// Total with taxes.
    pub price_total: Decimal,
    /// Whether this line is a tax line.
    pub tax_line: bool,
    /// Receivable/payable counterpart lines are hidden from the invoice lines.
    pub exclude_from_invoice_tab: bool,
}

impl MoveLine {
    /// Returns the signed balance (debit minus credit).
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns true for product lines of an invoice.
    #[must_use]
    pub fn is_invoice_line(&self) -> bool {
        !self.tax_line && !self.exclude_from_invoice_tab
    }
}

/// A balanced accounting transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// Entry ID.
    pub id: MoveId,
    /// What produced the entry.
    pub kind: MoveKind,
    /// Document type.
    pub move_type: MoveType,
    /// Posting state.
    pub state: MoveState,
    /// Accounting date.
    pub date: NaiveDate,
    /// Reference text.
    pub reference: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// Journal.
    pub journal_id: Option<JournalId>,
    /// Document currency.
    pub currency: Currency,
    /// Partner.
    pub partner_id: Option<PartnerId>,
    /// Asset whose board this entry belongs to.
    pub asset_id: Option<AssetId>,
    /// Depreciation carried by the entry, in asset currency.
    pub amount_total: Decimal,
    /// Residual value of the asset after this entry.
    pub asset_remaining_value: Decimal,
    /// Cumulative depreciation of the asset after this entry.
    pub asset_depreciated_value: Decimal,
    /// Posted automatically once its date is reached.
    pub auto_post: bool,
    /// Entry this one reverses.
    pub reversed_entry_id: Option<MoveId>,
    /// Lines.
    pub lines: Vec<MoveLine>,
}

impl Move {
    /// Returns true if the entry is a draft.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.state == MoveState::Draft
    }

    /// Returns true if the entry is posted.
    #[must_use]
    pub fn is_posted(&self) -> bool {
        self.state == MoveState::Posted
    }

    /// Sum of line debits.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// Sum of line credits.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }

    /// Lines posted to `account_id`.
    pub fn lines_on(&self, account_id: AccountId) -> impl Iterator<Item = &MoveLine> {
        self.lines.iter().filter(move |l| l.account_id == account_id)
    }
}

/// Input for a single line of a new ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveLineInput {
    /// Account posted to.
    pub account_id: AccountId,
    /// Label.
    pub name: Option<String>,
    /// Debit in company currency.
    pub debit: Decimal,
    /// Credit in company currency.
    pub credit: Decimal,
    /// Signed amount in the line currency.
    pub amount_currency: Decimal,
    /// Line currency.
    pub currency: Currency,
    /// Partner.
    pub partner_id: Option<PartnerId>,
    /// Product.
    pub product_id: Option<ProductId>,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit price.
    pub price_unit: Decimal,
    /// Total without taxes.
    pub price_subtotal: Decimal,
    /// Total with taxes.
    pub price_total: Decimal,
    /// Whether this line is a tax line.
    pub tax_line: bool,
    /// Hidden from the invoice lines.
    pub exclude_from_invoice_tab: bool,
}

impl MoveLineInput {
    /// Creates a line from a signed balance: positive debits, negative credits.
    ///
    /// `amount_currency` is the same balance expressed in `currency`.
    #[must_use]
    pub fn from_balance(
        account_id: AccountId,
        name: Option<String>,
        balance: Decimal,
        amount_currency: Decimal,
        currency: Currency,
    ) -> Self {
        let (debit, credit) = if balance > Decimal::ZERO {
            (balance, Decimal::ZERO)
        } else if balance < Decimal::ZERO {
            (Decimal::ZERO, -balance)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };
        Self {
            account_id,
            name,
            debit,
            credit,
            amount_currency,
            currency,
            partner_id: None,
            product_id: None,
            quantity: Decimal::ONE,
            price_unit: Decimal::ZERO,
            price_subtotal: Decimal::ZERO,
            price_total: Decimal::ZERO,
            tax_line: false,
            exclude_from_invoice_tab: false,
        }
    }

    /// Creates an invoice line for a product.
    ///
    /// The balance is `quantity × price_unit`, debited for bills and credited for
    /// customer invoices by the caller through `balance_sign`.
    #[must_use]
    pub fn product_line(
        account_id: AccountId,
        name: impl Into<String>,
        quantity: Decimal,
        price_unit: Decimal,
        currency: Currency,
        balance_sign: Decimal,
    ) -> Self {
        let subtotal = currency.round(quantity * price_unit);
        let balance = subtotal * balance_sign;
        Self {
            quantity,
            price_unit,
            price_subtotal: subtotal,
            price_total: subtotal,
            ..Self::from_balance(account_id, Some(name.into()), balance, balance, currency)
        }
    }

    /// Returns the signed balance (debit minus credit).
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Materialises the line once its entry has an ID.
    #[must_use]
    pub fn into_line(self, id: MoveLineId, move_id: MoveId) -> MoveLine {
        MoveLine {
            id,
            move_id,
            account_id: self.account_id,
            name: self.name,
            debit: self.debit,
            credit: self.credit,
            amount_currency: self.amount_currency,
            currency: self.currency,
            partner_id: self.partner_id,
            product_id: self.product_id,
            quantity: self.quantity,
            price_unit: self.price_unit,
            price_subtotal: self.price_subtotal,
            price_total: self.price_total,
            tax_line: self.tax_line,
            exclude_from_invoice_tab: self.exclude_from_invoice_tab,
        }
    }
}

/// Input for a new ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveInput {
    /// What produces the entry.
    pub kind: MoveKind,
    /// Document type.
    pub move_type: MoveType,
    /// Accounting date.
    pub date: NaiveDate,
    /// Reference text.
    pub reference: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// Journal.
    pub journal_id: Option<JournalId>,
    /// Document currency.
    pub currency: Currency,
    /// Partner.
    pub partner_id: Option<PartnerId>,
    /// Asset whose board the entry belongs to.
    pub asset_id: Option<AssetId>,
    /// Depreciation carried by the entry, in asset currency.
    pub amount_total: Decimal,
    /// Residual value of the asset after this entry.
    pub asset_remaining_value: Decimal,
    /// Cumulative depreciation of the asset after this entry.
    pub asset_depreciated_value: Decimal,
    /// Posted automatically once its date is reached.
    pub auto_post: bool,
    /// Entry this one reverses.
    pub reversed_entry_id: Option<MoveId>,
    /// Lines.
    pub lines: Vec<MoveLineInput>,
}

impl MoveInput {
    /// Creates an input without lines or asset data.
    #[must_use]
    pub fn new(
        kind: MoveKind,
        move_type: MoveType,
        company_id: CompanyId,
        date: NaiveDate,
        currency: Currency,
    ) -> Self {
        Self {
            kind,
            move_type,
            date,
            reference: String::new(),
            company_id,
            journal_id: None,
            currency,
            partner_id: None,
            asset_id: None,
            amount_total: Decimal::ZERO,
            asset_remaining_value: Decimal::ZERO,
            asset_depreciated_value: Decimal::ZERO,
            auto_post: false,
            reversed_entry_id: None,
            lines: Vec::new(),
        }
    }

    /// Creates an invoice or credit note from product lines.
    ///
    /// A balancing receivable/payable line on `counterpart_account` is appended.
    #[must_use]
    pub fn invoice(
        move_type: MoveType,
        company_id: CompanyId,
        date: NaiveDate,
        currency: Currency,
        counterpart_account: AccountId,
        mut lines: Vec<MoveLineInput>,
    ) -> Self {
        let total: Decimal = lines.iter().map(MoveLineInput::balance).sum();
        lines.push(MoveLineInput {
            exclude_from_invoice_tab: true,
            ..MoveLineInput::from_balance(counterpart_account, None, -total, -total, currency)
        });
        Self {
            lines,
            ..Self::new(MoveKind::Invoice, move_type, company_id, date, currency)
        }
    }

    /// Sum of line debits.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// Sum of line credits.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_balance_sides() {
        let account = AccountId::new();
        let debit = MoveLineInput::from_balance(account, None, dec!(100), dec!(100), Currency::Usd);
        assert_eq!((debit.debit, debit.credit), (dec!(100), dec!(0)));

        let credit = MoveLineInput::from_balance(account, None, dec!(-40), dec!(-40), Currency::Usd);
        assert_eq!((credit.debit, credit.credit), (dec!(0), dec!(40)));

        let zero = MoveLineInput::from_balance(account, None, dec!(0), dec!(0), Currency::Usd);
        assert_eq!((zero.debit, zero.credit), (dec!(0), dec!(0)));
    }

    #[test]
    fn test_invoice_appends_balancing_line() {
        let line = MoveLineInput::product_line(
            AccountId::new(),
            "Truck",
            dec!(2),
            dec!(500),
            Currency::Usd,
            Decimal::ONE,
        );
        assert_eq!(line.price_subtotal, dec!(1000));
        assert_eq!(line.debit, dec!(1000));

        let input = MoveInput::invoice(
            MoveType::InInvoice,
            CompanyId::new(),
            date(2021, 1, 1),
            Currency::Usd,
            AccountId::new(),
            vec![line],
        );
        assert_eq!(input.lines.len(), 2);
        assert!(input.lines[1].exclude_from_invoice_tab);
        assert_eq!(input.total_debit(), input.total_credit());
        assert_eq!(input.kind, MoveKind::Invoice);
    }

    #[test]
    fn test_move_type_flags() {
        assert!(MoveType::InInvoice.is_invoice());
        assert!(!MoveType::Entry.is_invoice());
        assert!(MoveType::OutRefund.is_refund());
        assert!(MoveType::OutRefund.is_customer_document());
        assert!(!MoveType::InRefund.is_customer_document());
    }

    #[test]
    fn test_only_value_decrease_is_value_change() {
        assert!(MoveKind::ValueDecrease.is_value_change());
        assert!(!MoveKind::ValueIncrease.is_value_change());
        assert!(!MoveKind::Depreciation.is_value_change());
        assert!(!MoveKind::Disposal.is_value_change());
    }
}
