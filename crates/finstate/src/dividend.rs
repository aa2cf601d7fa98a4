//! Dividend series builder.

use finstate_core::{Company, DividendItem, DividendRecord, FilingProvider, PeriodKey, Table, Value};
use tracing::{debug, warn};

use crate::config::{DividendCriterion, ReportConfig};
use crate::format::parse_figure;
use crate::matcher::match_rows;

/// Item fields holding the current, prior and penultimate year figures.
const PERIOD_FIELDS: [&str; 3] = ["thstrm", "frmtrm", "lwfr"];

fn figure_value(raw: &str, column: &str, year: i32) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return 0.0;
    }
    parse_figure(trimmed).unwrap_or_else(|| {
        warn!(column, year, raw = trimmed, "Unparseable dividend figure, using 0");
        0.0
    })
}

/// Extracts the figures of the first item satisfying `criterion`.
///
/// Produces up to three rows (`year`, `year - 1`, `year - 2`) in a single
/// column named after the criterion. Periods the item does not report are
/// left out.
#[must_use]
pub fn extract_criterion(record: &DividendRecord, year: i32, criterion: &DividendCriterion) -> Table {
    let column = criterion.column();
    let mut table = Table::new();

    let item: Option<&DividendItem> = match_rows(&record.list, std::slice::from_ref(&criterion.rule))
        .and_then(|items| items.into_iter().next());
    let Some(item) = item else {
        warn!(year, criterion = %criterion.rule, "No dividend item satisfies criterion");
        return table;
    };

    for (back, field) in PERIOD_FIELDS.iter().enumerate() {
        let period_year = year - back as i32;
        if let Some(raw) = item.get(field) {
            let value = figure_value(raw, &column, period_year);
            table.push_row(PeriodKey::Year(period_year), [(column.as_str(), Value::Float(value))]);
        }
    }
    table
}

/// Combines fetched dividend records into one year-indexed table.
///
/// Each criterion yields its own column; the per-criterion tables are
/// outer-joined and duplicate years keep the earliest fetched record.
#[must_use]
pub fn combine_records(records: &[(i32, DividendRecord)], criteria: &[DividendCriterion]) -> Table {
    let mut combined = Table::new();

    for criterion in criteria {
        let mut table = Table::new();
        for (year, record) in records {
            table.concat(extract_criterion(record, *year, criterion));
        }
        table.dedup_keep_first();
        combined = combined.outer_join(table);
    }

    combined.sort_by_period();
    combined.dedup_keep_first();
    combined
}

/// Builds the dividend table for `[start, end]` from annual dividend records.
///
/// Years whose record is missing or cannot be fetched contribute nothing.
pub async fn dividend_series(
    filings: &dyn FilingProvider,
    company: &Company,
    start: i32,
    end: i32,
    config: &ReportConfig,
) -> Table {
    let mut records = Vec::new();

    for year in start..=end {
        match filings.dividend_record(company, year).await {
            Ok(Some(record)) => {
                debug!(year, items = record.list.len(), "Fetched dividend record");
                records.push((year, record));
            }
            Ok(None) => {
                warn!(corp_code = %company.corp_code, year, "No dividend record filed");
            }
            Err(e) => {
                warn!(corp_code = %company.corp_code, year, error = %e, "Failed to fetch dividend record");
            }
        }
    }

    combine_records(&records, &config.dividend_criteria)
}
