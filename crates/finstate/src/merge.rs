//! Report merger.
//!
//! Joins the yearly statement with the auxiliary series, fills the gaps with
//! zero and derives ROE and BPS from the raw account columns before dropping
//! them.

use finstate_core::{Table, Value};
use tracing::debug;

use crate::config::{EQUITY, NET_INCOME, ReportConfig};
use crate::format::{percent, thousands};
use crate::price::{PRICE, PRICE_DATE};
use crate::shares::{COMMON, PREFERRED, TOTAL};
use crate::statement::account_column_rank;

/// Return on equity column.
pub const ROE: &str = "ROE";

/// Book value per share column.
pub const BPS: &str = "BPS";

/// The year-indexed tables making up a yearly report.
#[derive(Clone, Debug, Default)]
pub struct ReportParts {
    /// Statement table with raw and scaled account columns.
    pub statement: Table,
    /// Year-end prices.
    pub prices: Table,
    /// Issued share counts.
    pub shares: Table,
    /// Dividend metrics.
    pub dividends: Table,
}

/// Merges the parts of a yearly report.
///
/// Every year found in any part is kept. Missing cells are filled with zero
/// before the derived metrics are computed.
#[must_use]
pub fn merge_report(parts: ReportParts, config: &ReportConfig) -> Table {
    let mut report = parts
        .statement
        .outer_join(parts.prices)
        .outer_join(parts.shares)
        .outer_join(parts.dividends);

    report.drop_column(PRICE_DATE);
    report.sort_by_period();
    report.dedup_keep_first();
    report.fill_missing(&Value::Int(0));

    add_roe(&mut report);
    add_bps(&mut report);

    report.drop_columns(config.accounts.iter().map(|a| a.label.as_str()));
    report.sort_columns_by_key(|name| column_rank(name, config));
    report
}

fn numeric_column(table: &Table, name: &str) -> Vec<f64> {
    table
        .column(name)
        .into_iter()
        .map(|v| v.and_then(Value::as_f64).unwrap_or(0.0))
        .collect()
}

/// Net income over the mean equity of the row and the row before it.
///
/// The first row uses its own equity. A zero mean leaves the cell missing.
fn add_roe(report: &mut Table) {
    if !(report.has_column(NET_INCOME) && report.has_column(EQUITY)) {
        debug!("Skipping ROE, inputs missing");
        return;
    }

    let income = numeric_column(report, NET_INCOME);
    let equity = numeric_column(report, EQUITY);

    let values = income
        .iter()
        .enumerate()
        .map(|(i, income)| {
            let window = &equity[i.saturating_sub(1)..=i];
            let mean = window.iter().sum::<f64>() / window.len() as f64;
            (mean != 0.0).then(|| Value::Text(percent(income / mean, 1)))
        })
        .collect();
    report.set_column(ROE, values);
}

/// Equity over the total share count. A zero count leaves the cell missing.
fn add_bps(report: &mut Table) {
    if !(report.has_column(EQUITY) && report.has_column(TOTAL)) {
        debug!("Skipping BPS, inputs missing");
        return;
    }

    let equity = numeric_column(report, EQUITY);
    let shares = numeric_column(report, TOTAL);

    let values = equity
        .iter()
        .zip(&shares)
        .map(|(equity, shares)| (*shares != 0.0).then(|| Value::Text(thousands(equity / shares, 0))))
        .collect();
    report.set_column(BPS, values);
}

/// Orders report columns: accounts, price, share counts, dividends in
/// criteria order, derived metrics, then anything else.
fn column_rank(name: &str, config: &ReportConfig) -> (u8, u32, String) {
    if let Some((order, rest)) = account_column_rank(name, config) {
        return (0, order, rest);
    }
    let fixed = [PRICE, COMMON, PREFERRED, TOTAL];
    if let Some(i) = fixed.iter().position(|c| *c == name) {
        return (1, i as u32, String::new());
    }
    if let Some(i) = config.dividend_criteria.iter().position(|c| c.column() == name) {
        return (2, i as u32, String::new());
    }
    match name {
        ROE => (3, 0, String::new()),
        BPS => (3, 1, String::new()),
        _ => (4, 0, String::new()),
    }
}
