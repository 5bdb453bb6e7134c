//! Plain-text output.

use std::fmt::Write;

use deprecia_core::book::AssetBook;
use deprecia_core::report::{DepreciationReport, ReportColumns};
use deprecia_shared::types::AssetId;

/// Board of one asset: one line per entry with its running totals.
pub fn board(book: &AssetBook, asset_id: AssetId) -> anyhow::Result<String> {
    let asset = book.asset(asset_id)?;
    let mut out = String::new();
    writeln!(
        out,
        "{} [{}] {} {}",
        asset.name,
        book.lifecycle_stage(asset_id)?,
        asset.original_value,
        asset.currency
    )?;
    for entry in book.asset_entries(asset_id) {
        let reversed = if book.is_reversed(entry.id) { " (reversed)" } else { "" };
        writeln!(
            out,
            "  {}  {:<8} {:>14} {:>14} {:>14}  {}{}",
            entry.date,
            entry.state.as_str(),
            entry.amount_total,
            entry.asset_depreciated_value,
            entry.asset_remaining_value,
            entry.reference,
            reversed
        )?;
    }
    Ok(out)
}

fn amounts(columns: &ReportColumns) -> String {
    columns
        .values()
        .iter()
        .map(|v| format!("{v:>12.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The depreciation table with its total row.
pub fn report(report: &DepreciationReport) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "Depreciation table {} - {}{}",
        report.date_from,
        report.date_to,
        if report.all_entries { " (with draft entries)" } else { "" }
    )?;
    writeln!(
        out,
        "{:<30} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "", "Opening", "+", "-", "Closing", "Dep. open", "+", "-", "Dep. close", "Book value"
    )?;
    for row in &report.rows {
        writeln!(
            out,
            "{:<30} {}  {} {} {}",
            row.name,
            amounts(&row.columns),
            row.characteristics.acquisition_date,
            row.characteristics.method,
            row.characteristics.duration_rate
        )?;
    }
    writeln!(out, "{:<30} {}", "Total", amounts(&report.total))?;
    Ok(out)
}
