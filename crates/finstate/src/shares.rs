//! Issued share counts from annual report sections.
//!
//! The count comes from the "total number of shares" section of each annual
//! report: the table row whose first cells mention issued shares lists the
//! ordinary, preferred and total counts.

use chrono::NaiveDate;
use finstate_core::{
    Company, DataError, DocumentFetcher, FilingEntry, FilingKind, FilingProvider, PeriodKey,
    Result, Table, Value,
};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::ReportConfig;

/// Column holding the ordinary share count.
pub const COMMON: &str = "보통주";

/// Column holding the preferred share count.
pub const PREFERRED: &str = "우선주";

/// Column holding the total share count.
pub const TOTAL: &str = "주식수";

/// Remark OpenDART puts on annual reports carrying consolidated statements.
const CONSOLIDATED_REMARK: &str = "연";

/// Title prefix of an annual business report.
const ANNUAL_REPORT_TITLE: &str = "사업보고서";

/// Issued shares by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShareCounts {
    /// Ordinary shares.
    pub common: i64,
    /// Preferred shares.
    pub preferred: i64,
    /// All shares.
    pub total: i64,
}

fn cell_count(text: &str) -> i64 {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '-') && !c.is_whitespace())
        .collect();
    if !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit()) {
        cleaned.parse().unwrap_or(0)
    } else {
        0
    }
}

/// Reads the issued share row of a share count section.
///
/// The row is the parent of the first `td` whose text contains `marker`. Its
/// cells after the first hold the ordinary, preferred and total counts; cells
/// that are not plain numbers count as zero. Returns `None` if the row is
/// missing or too short.
#[must_use]
pub fn parse_issued_shares(html: &str, marker: &str) -> Option<ShareCounts> {
    let document = Html::parse_document(html);
    let td_selector = Selector::parse("td").ok()?;

    let marker_cell = document
        .select(&td_selector)
        .find(|td| td.text().collect::<String>().contains(marker))?;
    let row = marker_cell
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "tr")?;

    let cells: Vec<String> = row
        .select(&td_selector)
        .map(|td| td.text().collect::<String>())
        .collect();
    if cells.len() < 4 {
        debug!(cells = cells.len(), "Issued share row too short");
        return None;
    }

    Some(ShareCounts {
        common: cell_count(&cells[1]),
        preferred: cell_count(&cells[2]),
        total: cell_count(&cells[3]),
    })
}

/// Picks the annual report among filings listed in the submission window.
///
/// Consolidated reports win; otherwise the first filing titled as an annual
/// report is used.
#[must_use]
pub fn select_annual_filing(filings: &[FilingEntry]) -> Option<&FilingEntry> {
    filings
        .iter()
        .find(|f| f.rm.trim() == CONSOLIDATED_REMARK)
        .or_else(|| filings.iter().find(|f| f.report_nm.contains(ANNUAL_REPORT_TITLE)))
}

/// Fetches the share counts reported for `year`.
///
/// `Ok(None)` means the filing, section or row does not exist.
pub async fn shares_in_year(
    filings: &dyn FilingProvider,
    documents: &dyn DocumentFetcher,
    company: &Company,
    year: i32,
    config: &ReportConfig,
) -> Result<Option<ShareCounts>> {
    let (from, to): (NaiveDate, NaiveDate) = config.annual_filing_window.for_year(year)?;

    let listed = filings
        .list_filings(company, from, to, FilingKind::Periodic)
        .await?;
    let Some(filing) = select_annual_filing(&listed) else {
        debug!(year, listed = listed.len(), "No annual report in submission window");
        return Ok(None);
    };

    let sections = filings
        .sub_documents(&filing.rcept_no, &config.share_document_match)
        .await?;
    let Some(section) = sections.first() else {
        debug!(year, rcept_no = %filing.rcept_no, "Annual report has no sections");
        return Ok(None);
    };
    debug!(year, title = %section.title, "Reading share counts");

    let document = documents.fetch_document(&section.url).await?;
    if !document.is_ok() {
        return Err(DataError::Api {
            provider: documents.name().to_string(),
            status: document.status.to_string(),
            message: format!("Unexpected status fetching {}", section.url),
        });
    }

    Ok(parse_issued_shares(&document.body, &config.share_row_marker))
}

/// Builds the share count table for `[start, end]`.
///
/// Every failure, from listing filings to reading the row, skips the year.
pub async fn share_series(
    filings: &dyn FilingProvider,
    documents: &dyn DocumentFetcher,
    company: &Company,
    start: i32,
    end: i32,
    config: &ReportConfig,
) -> Table {
    let mut table = Table::new();

    for year in start..=end {
        match shares_in_year(filings, documents, company, year, config).await {
            Ok(Some(counts)) => {
                table.push_row(
                    PeriodKey::Year(year),
                    [
                        (COMMON, Value::Int(counts.common)),
                        (PREFERRED, Value::Int(counts.preferred)),
                        (TOTAL, Value::Int(counts.total)),
                    ],
                );
            }
            Ok(None) => {
                warn!(corp_code = %company.corp_code, year, "Share counts not found");
            }
            Err(e) => {
                warn!(corp_code = %company.corp_code, year, error = %e, "Failed to retrieve share counts");
            }
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{FakeDocuments, FakeFilings, company};

    const SHARES_HTML: &str = r#"
        <html><body>
        <table>
          <tr><td>구 분</td><td>보통주</td><td>우선주</td><td>합계</td></tr>
          <tr><td>Ⅰ. 발행할 주식의 총수</td><td>20,000,000,000</td><td>5,000,000,000</td><td>25,000,000,000</td></tr>
          <tr><td>Ⅳ. 발행주식의 총수 (Ⅱ-Ⅲ)</td><td>5,969,782,550</td><td>822,886,700</td><td>6,792,669,250</td><td>-</td></tr>
          <tr><td>Ⅵ. 유통주식수 (Ⅳ-Ⅴ)</td><td>5,969,782,550</td><td>822,886,700</td><td>6,792,669,250</td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_parse_issued_shares() {
        let counts = parse_issued_shares(SHARES_HTML, "발행주식").unwrap();
        assert_eq!(
            counts,
            ShareCounts {
                common: 5_969_782_550,
                preferred: 822_886_700,
                total: 6_792_669_250,
            }
        );
    }

    #[test]
    fn test_dash_cells_are_zero() {
        let html = "<table><tr><td>발행주식의 총수</td><td>1,000</td><td>-</td><td>1,000</td></tr></table>";
        let counts = parse_issued_shares(html, "발행주식").unwrap();
        assert_eq!(counts.preferred, 0);
        assert_eq!(counts.total, 1000);
    }

    #[test]
    fn test_missing_or_short_row() {
        assert!(parse_issued_shares("<table><tr><td>합계</td></tr></table>", "발행주식").is_none());
        assert!(
            parse_issued_shares("<table><tr><td>발행주식</td><td>1</td></tr></table>", "발행주식")
                .is_none()
        );
    }

    #[test]
    fn test_select_annual_filing() {
        let entry = |report_nm: &str, rm: &str| FilingEntry {
            report_nm: report_nm.to_string(),
            rm: rm.to_string(),
            ..Default::default()
        };

        let listed = vec![
            entry("분기보고서 (2020.09)", ""),
            entry("사업보고서 (2020.12)", ""),
            entry("[기재정정]사업보고서 (2020.12)", "연"),
        ];
        assert_eq!(
            select_annual_filing(&listed).map(|f| f.report_nm.as_str()),
            Some("[기재정정]사업보고서 (2020.12)")
        );

        let listed = vec![entry("분기보고서 (2020.09)", ""), entry("사업보고서 (2020.12)", "")];
        assert_eq!(
            select_annual_filing(&listed).map(|f| f.report_nm.as_str()),
            Some("사업보고서 (2020.12)")
        );

        assert!(select_annual_filing(&[entry("반기보고서 (2020.06)", "")]).is_none());
    }

    #[tokio::test]
    async fn test_share_series() {
        let filings = FakeFilings::default()
            .with_filing("20210309000744", "20210309", "사업보고서 (2020.12)", "연")
            .with_section("20210309000744", "1. 회사의 개요", "http://viewer/overview")
            .with_section("20210309000744", "4. 주식의 총수 등", "http://viewer/shares");
        let documents = FakeDocuments::default().with_document("http://viewer/shares", 200, SHARES_HTML);

        let table = share_series(
            &filings,
            &documents,
            &company(),
            2019,
            2020,
            &ReportConfig::default(),
        )
        .await;

        let years: Vec<i32> = table.keys().map(|k| k.year()).collect();
        assert_eq!(years, [2020]);
        assert_eq!(table.columns(), [COMMON, PREFERRED, TOTAL]);
        assert_eq!(
            table.get(&PeriodKey::Year(2020), TOTAL),
            Some(&Value::Int(6_792_669_250))
        );
    }

    #[tokio::test]
    async fn test_bad_status_is_error() {
        let filings = FakeFilings::default()
            .with_filing("20210309000744", "20210309", "사업보고서 (2020.12)", "연")
            .with_section("20210309000744", "4. 주식의 총수 등", "http://viewer/shares");
        let documents = FakeDocuments::default();

        let result = shares_in_year(
            &filings,
            &documents,
            &company(),
            2020,
            &ReportConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(DataError::Api { ref status, .. }) if status == "404"));
    }
}
