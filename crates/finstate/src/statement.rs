//! Statement builders.
//!
//! Canonical accounts are extracted from full financial statement filings into
//! period-keyed rows. An annual filing reports the current year and the two
//! before it; a quarterly filing contributes its current period only.

use finstate_core::{Company, FilingProvider, PeriodKey, RawFilingRow, ReportCode, Table, Value};
use tracing::{debug, warn};

use crate::config::{AccountDefinition, ReportConfig};
use crate::format::{parse_amount, thousands};
use crate::matcher::match_rows;

/// Resolves an amount string; empty or unparseable amounts count as zero.
fn amount_value(raw: &str, account: &str, period: PeriodKey) -> i64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    parse_amount(trimmed).unwrap_or_else(|| {
        warn!(account, period = %period, raw = trimmed, "Unparseable amount, using 0");
        0
    })
}

/// Returns the row chosen for `account`, logging a miss.
fn find_account<'a>(
    rows: &'a [RawFilingRow],
    account: &AccountDefinition,
    period: PeriodKey,
) -> Option<&'a RawFilingRow> {
    let row = match_rows(rows, &account.rules).and_then(|matched| matched.into_iter().next());
    if row.is_none() {
        warn!(account = %account.label, period = %period, "Account not found in filing");
    }
    row
}

/// Extracts the rows of one annual filing for `year`, `year - 1` and `year - 2`.
///
/// A prior period is emitted only for accounts whose row reports it; rows with
/// no cells are left out.
#[must_use]
pub fn extract_yearly(rows: &[RawFilingRow], year: i32, accounts: &[AccountDefinition]) -> Table {
    let mut periods: [Vec<(String, Value)>; 3] = Default::default();

    for account in accounts {
        let Some(row) = find_account(rows, account, PeriodKey::Year(year)) else {
            continue;
        };
        for (back, cells) in periods.iter_mut().enumerate() {
            let period = PeriodKey::Year(year - back as i32);
            if let Some(raw) = row.amount(back) {
                let amount = amount_value(raw, &account.label, period);
                cells.push((account.label.clone(), Value::Int(amount)));
            }
        }
    }

    let mut table = Table::new();
    for (back, cells) in periods.into_iter().enumerate() {
        if !cells.is_empty() {
            table.push_row(PeriodKey::Year(year - back as i32), cells);
        }
    }
    table
}

/// Extracts the current-period cells of one quarterly filing.
#[must_use]
pub fn extract_current(
    rows: &[RawFilingRow],
    period: PeriodKey,
    accounts: &[AccountDefinition],
) -> Vec<(String, Value)> {
    accounts
        .iter()
        .filter_map(|account| {
            let row = find_account(rows, account, period)?;
            let amount = amount_value(row.amount(0).unwrap_or_default(), &account.label, period);
            Some((account.label.clone(), Value::Int(amount)))
        })
        .collect()
}

/// Builds the yearly statement table for `[start, end]`.
///
/// Years whose filing is missing or cannot be fetched contribute nothing. Rows
/// are sorted by year and duplicate years keep the earliest fetched row, so the
/// current-period figure of a filing wins over later restatements.
pub async fn yearly_statement(
    filings: &dyn FilingProvider,
    company: &Company,
    start: i32,
    end: i32,
    config: &ReportConfig,
) -> Table {
    let mut table = Table::new();

    for year in start..=end {
        match filings
            .financial_statement(company, year, ReportCode::Annual)
            .await
        {
            Ok(Some(rows)) => {
                debug!(year, rows = rows.len(), "Extracting annual statement");
                table.concat(extract_yearly(&rows, year, &config.accounts));
            }
            Ok(None) => {
                warn!(corp_code = %company.corp_code, year, "No annual statement filed");
            }
            Err(e) => {
                warn!(corp_code = %company.corp_code, year, error = %e, "Failed to fetch annual statement");
            }
        }
    }

    table.sort_by_period();
    let removed = table.dedup_keep_first();
    debug!(removed, "Collapsed duplicate years");

    add_scaled_columns(&mut table, config);
    table
}

/// Builds the quarterly statement table for every report of `[start, end]`.
///
/// Each row carries the current-period amounts, their scaled columns and a link
/// to the filing's business description section. Raw amount columns are
/// dropped.
pub async fn quarterly_statement(
    filings: &dyn FilingProvider,
    company: &Company,
    start: i32,
    end: i32,
    config: &ReportConfig,
) -> Table {
    let mut table = Table::new();
    let link_column = config.report_link_column();

    for year in start..=end {
        for report in ReportCode::QUARTERLY {
            let period = PeriodKey::Quarter { year, report };
            let rows = match filings.financial_statement(company, year, report).await {
                Ok(Some(rows)) => rows,
                Ok(None) => {
                    debug!(period = %period, "No report filed");
                    continue;
                }
                Err(e) => {
                    warn!(corp_code = %company.corp_code, period = %period, error = %e, "Failed to fetch report");
                    continue;
                }
            };

            let mut cells = extract_current(&rows, period, &config.accounts);
            if let Some(url) = report_link(filings, &rows, period, config).await {
                cells.push((link_column.clone(), Value::Text(url)));
            }
            if !cells.is_empty() {
                table.push_row(period, cells);
            }
        }
    }

    table.sort_by_period();
    table.dedup_keep_first();

    add_scaled_columns(&mut table, config);
    table.drop_columns(config.accounts.iter().map(|a| a.label.as_str()));
    table
}

/// Looks up the business description section of the filing `rows` came from.
async fn report_link(
    filings: &dyn FilingProvider,
    rows: &[RawFilingRow],
    period: PeriodKey,
    config: &ReportConfig,
) -> Option<String> {
    let rcept_no = rows.iter().map(|r| r.rcept_no.as_str()).find(|r| !r.is_empty())?;

    match filings
        .sub_documents(rcept_no, &config.business_document_match)
        .await
    {
        Ok(sections) => {
            let section = sections.into_iter().next();
            if section.is_none() {
                warn!(period = %period, rcept_no, "Filing has no sections");
            }
            section.map(|s| s.url)
        }
        Err(e) => {
            warn!(period = %period, rcept_no, error = %e, "Failed to list filing sections");
            None
        }
    }
}

/// Adds a scaled, comma-formatted column for every account present and sorts
/// the account columns by `(order, label)`.
pub(crate) fn add_scaled_columns(table: &mut Table, config: &ReportConfig) {
    let divisor = config.unit_divisor;
    for account in &config.accounts {
        if !table.has_column(&account.label) {
            continue;
        }
        table.derive_column(&account.label, config.scaled_column(account), |v| {
            v.as_f64().map(|amount| Value::Text(thousands(amount / divisor, 0)))
        });
    }

    table.sort_columns_by_key(|name| account_column_rank(name, config).unwrap_or((u32::MAX, String::new())));
}

/// Sort key of an account column: raw labels by their order, and `"{order}.name"`
/// columns by their prefix. Other columns have no rank.
pub(crate) fn account_column_rank(name: &str, config: &ReportConfig) -> Option<(u32, String)> {
    if let Some(account) = config.account(name) {
        return Some((account.order, account.label.clone()));
    }
    let (prefix, rest) = name.split_once('.')?;
    let order = prefix.parse().ok()?;
    Some((order, rest.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{FakeFilings, company, current_row, raw_row};
    use crate::matcher::RuleSet;

    fn revenue_only() -> ReportConfig {
        ReportConfig::default().with_accounts(vec![AccountDefinition::new(
            "매출액",
            1,
            vec![RuleSet::new([("account_nm", "매출액")])],
        )])
    }

    #[test]
    fn test_extract_yearly_three_periods() {
        let rows = vec![raw_row("ifrs-full_Revenue", "매출액", "-", ["1000", "900", "800"])];
        let table = extract_yearly(&rows, 2020, &revenue_only().accounts);

        let years: Vec<i32> = table.keys().map(|k| k.year()).collect();
        assert_eq!(years, [2020, 2019, 2018]);
        assert_eq!(table.get(&PeriodKey::Year(2020), "매출액"), Some(&Value::Int(1000)));
        assert_eq!(table.get(&PeriodKey::Year(2019), "매출액"), Some(&Value::Int(900)));
        assert_eq!(table.get(&PeriodKey::Year(2018), "매출액"), Some(&Value::Int(800)));
    }

    #[test]
    fn test_extract_yearly_empty_prior_amounts_are_zero() {
        let rows = vec![raw_row("ifrs-full_Revenue", "매출액", "-", ["1000", "", " "])];
        let table = extract_yearly(&rows, 2020, &revenue_only().accounts);

        assert_eq!(table.get(&PeriodKey::Year(2020), "매출액"), Some(&Value::Int(1000)));
        assert_eq!(table.get(&PeriodKey::Year(2019), "매출액"), Some(&Value::Int(0)));
        assert_eq!(table.get(&PeriodKey::Year(2018), "매출액"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_extract_yearly_unreported_periods_have_no_row() {
        let rows = vec![current_row("ifrs-full_Revenue", "매출액", "1000")];
        let table = extract_yearly(&rows, 2020, &revenue_only().accounts);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_extract_yearly_unparseable_amount_is_zero() {
        let rows = vec![raw_row("ifrs-full_Revenue", "매출액", "-", ["n/a", "1,500", "800"])];
        let table = extract_yearly(&rows, 2020, &revenue_only().accounts);
        assert_eq!(table.get(&PeriodKey::Year(2020), "매출액"), Some(&Value::Int(0)));
        assert_eq!(table.get(&PeriodKey::Year(2019), "매출액"), Some(&Value::Int(1500)));
    }

    #[test]
    fn test_extract_yearly_missing_account_is_absent() {
        let rows = vec![raw_row("ifrs-full_Revenue", "매출액", "-", ["1000", "900", "800"])];
        let table = extract_yearly(&rows, 2020, &ReportConfig::default().accounts);
        assert_eq!(table.columns(), ["매출액"]);
    }

    #[test]
    fn test_extract_yearly_uses_first_matched_row() {
        let rows = vec![
            raw_row("ifrs-full_Revenue", "매출액", "-", ["1000", "900", "800"]),
            raw_row("ifrs-full_Revenue", "매출액", "별도", ["1", "2", "3"]),
        ];
        let table = extract_yearly(&rows, 2020, &revenue_only().accounts);
        assert_eq!(table.get(&PeriodKey::Year(2020), "매출액"), Some(&Value::Int(1000)));
    }

    #[tokio::test]
    async fn test_yearly_statement_skips_missing_year() {
        let filings = FakeFilings::default()
            .with_statement(2018, ReportCode::Annual, vec![current_row("r", "매출액", "800")])
            .with_statement(2020, ReportCode::Annual, vec![current_row("r", "매출액", "1000")]);

        let table = yearly_statement(&filings, &company(), 2018, 2020, &revenue_only()).await;

        let years: Vec<i32> = table.keys().map(|k| k.year()).collect();
        assert_eq!(years, [2018, 2020]);
    }

    #[tokio::test]
    async fn test_yearly_statement_tolerates_fetch_errors() {
        let filings = FakeFilings::default()
            .with_statement(2018, ReportCode::Annual, vec![current_row("r", "매출액", "800")])
            .with_failing_statement(2019, ReportCode::Annual)
            .with_statement(2020, ReportCode::Annual, vec![current_row("r", "매출액", "1000")]);

        let table = yearly_statement(&filings, &company(), 2018, 2020, &revenue_only()).await;
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_yearly_statement_keeps_earliest_fetched_year() {
        let filings = FakeFilings::default()
            .with_statement(
                2019,
                ReportCode::Annual,
                vec![raw_row("r", "매출액", "-", ["900", "700", "600"])],
            )
            .with_statement(
                2020,
                ReportCode::Annual,
                vec![raw_row("r", "매출액", "-", ["1000", "950", "710"])],
            );

        let table = yearly_statement(&filings, &company(), 2019, 2020, &revenue_only()).await;

        let years: Vec<i32> = table.keys().map(|k| k.year()).collect();
        assert_eq!(years, [2017, 2018, 2019, 2020]);
        // 2019 and 2018 come from the 2019 filing, fetched first.
        assert_eq!(table.get(&PeriodKey::Year(2019), "매출액"), Some(&Value::Int(900)));
        assert_eq!(table.get(&PeriodKey::Year(2018), "매출액"), Some(&Value::Int(700)));
    }

    #[tokio::test]
    async fn test_yearly_statement_scaled_columns() {
        let filings = FakeFilings::default().with_statement(
            2020,
            ReportCode::Annual,
            vec![
                current_row("ifrs-full_Liabilities", "부채총계", "102287702000000"),
                current_row("ifrs-full_Revenue", "매출액", "236806988000000"),
            ],
        );

        let table =
            yearly_statement(&filings, &company(), 2020, 2020, &ReportConfig::default()).await;

        assert_eq!(
            table.columns(),
            ["매출액", "1.매출액(억)", "부채총계", "7.부채총계(억)"]
        );
        let key = PeriodKey::Year(2020);
        assert_eq!(
            table.get(&key, "1.매출액(억)"),
            Some(&Value::Text("2,368,070".to_string()))
        );
        assert_eq!(
            table.get(&key, "7.부채총계(억)"),
            Some(&Value::Text("1,022,877".to_string()))
        );
    }

    #[tokio::test]
    async fn test_yearly_statement_empty_range() {
        let table =
            yearly_statement(&FakeFilings::default(), &company(), 2018, 2020, &revenue_only()).await;
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_quarterly_statement() {
        let mut q1 = current_row("ifrs-full_Revenue", "매출액", "550000000000");
        q1.rcept_no = "20200515001451".to_string();
        let annual = current_row("ifrs-full_Revenue", "매출액", "2368069880000");

        let filings = FakeFilings::default()
            .with_statement(2020, ReportCode::FirstQuarter, vec![q1])
            .with_statement(2020, ReportCode::Annual, vec![annual])
            .with_section("20200515001451", "I. 회사의 개요", "http://viewer/overview")
            .with_section("20200515001451", "II. 사업의 내용", "http://viewer/business");

        let table = quarterly_statement(&filings, &company(), 2020, 2020, &revenue_only()).await;

        let keys: Vec<String> = table.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["2020.1Q", "2020.4Q"]);
        assert_eq!(table.columns(), ["1.매출액(억)", "2.보고서"]);

        let q1_key = PeriodKey::Quarter {
            year: 2020,
            report: ReportCode::FirstQuarter,
        };
        assert_eq!(
            table.get(&q1_key, "1.매출액(억)"),
            Some(&Value::Text("5,500".to_string()))
        );
        assert_eq!(
            table.get(&q1_key, "2.보고서"),
            Some(&Value::Text("http://viewer/business".to_string()))
        );

        // The annual filing has sections registered under another receipt number.
        let q4_key = PeriodKey::Quarter {
            year: 2020,
            report: ReportCode::Annual,
        };
        assert_eq!(table.get(&q4_key, "2.보고서"), None);
    }

    #[tokio::test]
    async fn test_quarterly_statement_skips_failed_reports() {
        let filings = FakeFilings::default()
            .with_failing_statement(2020, ReportCode::FirstQuarter)
            .with_statement(2020, ReportCode::HalfYear, vec![current_row("r", "매출액", "100000000")]);

        let table = quarterly_statement(&filings, &company(), 2020, 2020, &revenue_only()).await;

        let keys: Vec<String> = table.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["2020.2Q"]);
        assert!(!table.has_column("매출액"));
    }

    #[test]
    fn test_account_columns_sort_numerically() {
        let config = ReportConfig::default().with_accounts(
            (1..=10)
                .map(|order| AccountDefinition::new(format!("a{order}"), order, vec![]))
                .collect(),
        );

        let mut table = Table::new();
        table.push_row(
            PeriodKey::Year(2020),
            [("a10", Value::Int(1)), ("a2", Value::Int(2))],
        );
        add_scaled_columns(&mut table, &config);

        assert_eq!(table.columns(), ["a2", "2.a2(억)", "a10", "10.a10(억)"]);
    }
}
