//! Depreciation table generation.

use std::collections::HashMap;

use deprecia_shared::types::{AssetId, Currency, MoveId};
use rust_decimal::Decimal;
use tracing::debug;

use super::error::ReportError;
use super::types::{Characteristics, DepreciationReport, ReportColumns, ReportOptions, ReportRow};
use crate::asset::{Asset, AssetState, AssetType, DepreciationMethod, MethodPeriod};
use crate::book::AssetBook;
use crate::currency::{CurrencyService, RateCache, RateKey};
use crate::ledger::{Move, MoveKind};

/// Builds the depreciation table of an asset book.
///
/// Depreciation columns are read off the running totals stored on the first
/// and last entry of each asset in the range, so a row costs one pass over the
/// asset's board. Exchange rates are memoised for the duration of a render.
#[derive(Debug, Default)]
pub struct DepreciationReportService {
    rates: RateCache,
}

/// Where an asset's board stands over the report range.
#[derive(Debug, Default)]
struct BoardSlice {
    depreciated_start: Decimal,
    depreciated_end: Decimal,
    first_amount: Decimal,
    first_move_id: Option<MoveId>,
    last_move_id: Option<MoveId>,
    entry_count: u32,
}

impl BoardSlice {
    /// Entries reversed by another entry are left out; drafts only count with `all_entries`.
    fn of(book: &AssetBook, asset_id: AssetId, options: &ReportOptions) -> Self {
        let entries: Vec<&Move> = book
            .asset_entries(asset_id)
            .into_iter()
            .filter(|m| !book.is_reversed(m.id))
            .collect();
        let entry_count = entries.iter().filter(|m| !m.kind.is_value_change()).count();

        let visible: Vec<&Move> = entries
            .into_iter()
            .filter(|m| options.all_entries || m.is_posted())
            .collect();
        let in_range = |m: &&&Move| m.date >= options.date_from && m.date <= options.date_to;

        // Same date: the latest entry wins.
        let first = visible
            .iter()
            .filter(in_range)
            .min_by(|a, b| a.date.cmp(&b.date).then(b.id.cmp(&a.id)));
        let last = visible.iter().filter(in_range).max_by_key(|m| (m.date, m.id));
        let before = visible
            .iter()
            .filter(|m| m.date <= options.date_from)
            .max_by_key(|m| (m.date, m.id));

        let start = first.or(before);
        let end = last.or(before);
        Self {
            depreciated_start: start.map_or(Decimal::ZERO, |m| m.asset_depreciated_value),
            depreciated_end: end.map_or(Decimal::ZERO, |m| m.asset_depreciated_value),
            first_amount: first.map_or(Decimal::ZERO, |m| m.amount_total),
            first_move_id: start.map(|m| m.id),
            last_move_id: end.map(|m| m.id),
            entry_count: u32::try_from(entry_count).unwrap_or(u32::MAX),
        }
    }
}

impl DepreciationReportService {
    /// Creates a service with the default rate cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service memoising at most `capacity` rates per render.
    #[must_use]
    pub fn with_cache_capacity(capacity: u64) -> Self {
        Self {
            rates: RateCache::with_capacity(capacity),
        }
    }

    /// Builds the depreciation table for `options`.
    ///
    /// Rows cover open and closed purchase assets acquired by the end of the
    /// range and not disposed of before its start. Child assets are rolled
    /// into their parent's row.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` for an inverted range and
    /// `ReportError::NoExchangeRate` when an asset's value cannot be
    /// converted to its company's currency.
    pub fn generate(&self, book: &AssetBook, options: &ReportOptions) -> Result<DepreciationReport, ReportError> {
        options.validate()?;
        self.rates.invalidate_all();

        let mut selected: Vec<(&Asset, Option<String>)> = book
            .assets()
            .filter(|a| is_reported(a, options))
            .map(|a| {
                let code = a
                    .accounts
                    .asset
                    .and_then(|id| book.account(id).ok())
                    .map(|account| account.code.clone());
                (a, code)
            })
            .collect();
        // Assets without an account come last.
        selected.sort_by(|(a, a_code), (b, b_code)| {
            (a_code.is_none(), a_code, a.acquisition_date, a.id).cmp(&(
                b_code.is_none(),
                b_code,
                b.acquisition_date,
                b.id,
            ))
        });

        let mut children: HashMap<AssetId, Vec<&Asset>> = HashMap::new();
        for (asset, _) in &selected {
            if let Some(parent_id) = asset.parent_id {
                children.entry(parent_id).or_default().push(asset);
            }
        }

        let mut rows = Vec::new();
        let mut total = ReportColumns::default();
        for (asset, account_code) in selected.iter().filter(|(a, _)| a.parent_id.is_none()) {
            let family = children.get(&asset.id).map_or(&[][..], Vec::as_slice);
            let row = self.row(book, asset, account_code.clone(), family, options)?;
            total += row.columns;
            rows.push(row);
        }

        debug!(
            date_from = %options.date_from,
            date_to = %options.date_to,
            rows = rows.len(),
            "Depreciation table generated"
        );
        Ok(DepreciationReport {
            date_from: options.date_from,
            date_to: options.date_to,
            all_entries: options.all_entries,
            rows,
            total,
        })
    }

    fn row(
        &self,
        book: &AssetBook,
        asset: &Asset,
        account_code: Option<String>,
        children: &[&Asset],
        options: &ReportOptions,
    ) -> Result<ReportRow, ReportError> {
        let company_currency = book
            .company(asset.company_id)
            .map_err(|_| ReportError::CompanyNotFound(asset.company_id))?
            .currency;
        let slice = BoardSlice::of(book, asset.id, options);
        let rate = self.rate(book, asset, company_currency)?;
        let convert = |value: Decimal, rate: Decimal| CurrencyService::convert(value, rate, company_currency);

        let mut columns = ReportColumns {
            depreciation_opening: convert(slice.depreciated_start, rate) - convert(slice.first_amount, rate),
            depreciation_closing: convert(slice.depreciated_end, rate),
            ..ReportColumns::default()
        };
        let original = convert(asset.original_value, rate);
        if asset.acquisition_date < options.date_from {
            columns.asset_opening = original;
        } else {
            columns.asset_add = original;
        }

        if !asset.already_depreciated_amount_import.is_zero() {
            let imported = convert(asset.already_depreciated_amount_import, rate);
            columns.asset_opening += columns.asset_add;
            columns.asset_add = Decimal::ZERO;
            columns.depreciation_opening += imported;
            columns.depreciation_closing += imported;
        }

        for child in children {
            let child_slice = BoardSlice::of(book, child.id, options);
            let child_rate = self.rate(book, child, company_currency)?;
            columns.depreciation_opening +=
                convert(child_slice.depreciated_start, child_rate) - convert(child_slice.first_amount, child_rate);
            columns.depreciation_closing += convert(child_slice.depreciated_end, child_rate);

            let child_original = convert(child.original_value, child_rate);
            if child.acquisition_date < options.date_from {
                columns.asset_opening += child_original;
            } else {
                columns.asset_add += child_original;
            }
        }

        columns.depreciation_add = columns.depreciation_closing - columns.depreciation_opening;
        columns.asset_closing = columns.asset_opening + columns.asset_add;

        let disposed_in_range = asset.state == AssetState::Close
            && asset.disposal_date.is_some_and(|d| d <= options.date_to);
        if disposed_in_range {
            columns.depreciation_minus = columns.depreciation_closing;
            // Only the disposal entry falls in the range: nothing was depreciated in it.
            if slice.first_move_id == slice.last_move_id {
                columns.depreciation_opening = columns.depreciation_closing;
                columns.depreciation_add = Decimal::ZERO;
            }
            columns.depreciation_closing = Decimal::ZERO;
            columns.asset_minus = columns.asset_closing;
            columns.asset_closing = Decimal::ZERO;
        }
        columns.book_value = columns.asset_closing - columns.depreciation_closing;

        let first_depreciation_date = asset
            .first_depreciation_date_import
            .or(asset.first_depreciation_date)
            .or_else(|| {
                book.asset_entries(asset.id)
                    .into_iter()
                    .find(|m| m.kind == MoveKind::Depreciation)
                    .map(|m| m.date)
            });
        let periods = (slice.entry_count + asset.depreciation_number_import)
            .saturating_sub(u32::from(asset.terms.prorata));

        Ok(ReportRow {
            asset_id: asset.id,
            name: asset.name.clone(),
            company_id: asset.company_id,
            account_id: asset.accounts.asset,
            account_code,
            characteristics: Characteristics {
                acquisition_date: asset.acquisition_date,
                first_depreciation_date,
                method: asset.terms.method.label().to_string(),
                duration_rate: duration_rate(
                    asset.terms.method,
                    asset.terms.progress_factor,
                    periods,
                    asset.terms.method_period,
                ),
            },
            columns,
        })
    }

    fn rate(&self, book: &AssetBook, asset: &Asset, company_currency: Currency) -> Result<Decimal, ReportError> {
        if asset.currency == company_currency {
            return Ok(Decimal::ONE);
        }
        let key = RateKey {
            from: asset.currency,
            to: company_currency,
            company_id: asset.company_id,
            date: asset.acquisition_date,
        };
        self.rates
            .get_or_lookup(book.rates(), key)
            .ok_or(ReportError::NoExchangeRate {
                from: asset.currency,
                to: company_currency,
                date: asset.acquisition_date,
            })
    }
}

fn is_reported(asset: &Asset, options: &ReportOptions) -> bool {
    asset.acquisition_date <= options.date_to
        && asset.disposal_date.is_none_or(|d| d >= options.date_from)
        && !matches!(asset.state, AssetState::Model | AssetState::Draft)
        && asset.asset_type == AssetType::Purchase
        && asset.active
        && options.includes_company(asset.company_id)
}

/// Duration of a linear board over `periods`, or the declining factor.
pub(super) fn duration_rate(
    method: DepreciationMethod,
    progress_factor: Decimal,
    periods: u32,
    period: MethodPeriod,
) -> String {
    match method {
        DepreciationMethod::Linear if periods == 0 => "0.00 %".to_string(),
        DepreciationMethod::Linear => {
            let total_months = periods * period.months();
            let years = total_months / 12;
            let months = total_months % 12;
            let mut parts = Vec::new();
            if years > 0 {
                parts.push(format!("{years} y"));
            }
            if months > 0 {
                parts.push(format!("{months} m"));
            }
            parts.join(" ")
        }
        DepreciationMethod::Declining | DepreciationMethod::DecliningThenLinear => {
            format!("{:.2} %", progress_factor * Decimal::ONE_HUNDRED)
        }
    }
}
