//! In-memory providers and sample records for pipeline tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use finstate_core::{
    Company, CorpEntry, DailyClose, DataError, DataProvider, DirectoryProvider, DividendItem,
    DividendRecord, DocumentFetcher, FilingEntry, FilingKind, FilingProvider, HttpDocument,
    PriceProvider, RawFilingRow, ReportCode, Result, SubDocument, Ticker,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn company() -> Company {
    Company::new("삼성전자", "00126380", Ticker::new("005930"))
}

/// A statement row reporting all three periods.
pub(crate) fn raw_row(
    account_id: &str,
    account_nm: &str,
    account_detail: &str,
    amounts: [&str; 3],
) -> RawFilingRow {
    RawFilingRow {
        rcept_no: "20210309000744".to_string(),
        sj_div: "IS".to_string(),
        account_id: account_id.to_string(),
        account_nm: account_nm.to_string(),
        account_detail: account_detail.to_string(),
        thstrm_amount: Some(amounts[0].to_string()),
        frmtrm_amount: Some(amounts[1].to_string()),
        bfefrmtrm_amount: Some(amounts[2].to_string()),
        currency: "KRW".to_string(),
        ..Default::default()
    }
}

/// A statement row reporting only the current period.
pub(crate) fn current_row(account_id: &str, account_nm: &str, amount: &str) -> RawFilingRow {
    RawFilingRow {
        frmtrm_amount: None,
        bfefrmtrm_amount: None,
        ..raw_row(account_id, account_nm, "-", [amount, "", ""])
    }
}

pub(crate) fn dividend_item(se: &str, amounts: [&str; 3]) -> DividendItem {
    DividendItem::from_pairs([
        ("se", se),
        ("stock_knd", "보통주"),
        ("thstrm", amounts[0]),
        ("frmtrm", amounts[1]),
        ("lwfr", amounts[2]),
    ])
}

#[derive(Debug, Default)]
pub(crate) struct FakeFilings {
    pub(crate) statements: HashMap<(i32, ReportCode), Vec<RawFilingRow>>,
    pub(crate) failing_statements: HashSet<(i32, ReportCode)>,
    pub(crate) dividends: HashMap<i32, DividendRecord>,
    pub(crate) filings: Vec<FilingEntry>,
    pub(crate) sections: HashMap<String, Vec<SubDocument>>,
}

impl FakeFilings {
    pub(crate) fn with_statement(
        mut self,
        year: i32,
        report: ReportCode,
        rows: Vec<RawFilingRow>,
    ) -> Self {
        self.statements.insert((year, report), rows);
        self
    }

    pub(crate) fn with_failing_statement(mut self, year: i32, report: ReportCode) -> Self {
        self.failing_statements.insert((year, report));
        self
    }

    pub(crate) fn with_dividends(mut self, year: i32, items: Vec<DividendItem>) -> Self {
        self.dividends.insert(year, DividendRecord { list: items });
        self
    }

    pub(crate) fn with_filing(mut self, rcept_no: &str, rcept_dt: &str, report_nm: &str, rm: &str) -> Self {
        self.filings.push(FilingEntry {
            corp_code: "00126380".to_string(),
            corp_name: "삼성전자".to_string(),
            report_nm: report_nm.to_string(),
            rcept_no: rcept_no.to_string(),
            rcept_dt: rcept_dt.to_string(),
            rm: rm.to_string(),
        });
        self
    }

    pub(crate) fn with_section(mut self, rcept_no: &str, title: &str, url: &str) -> Self {
        self.sections
            .entry(rcept_no.to_string())
            .or_default()
            .push(SubDocument {
                title: title.to_string(),
                url: url.to_string(),
            });
        self
    }
}

impl DataProvider for FakeFilings {
    fn name(&self) -> &str {
        "fake filings"
    }

    fn description(&self) -> &str {
        "canned filings"
    }
}

#[async_trait]
impl FilingProvider for FakeFilings {
    async fn list_filings(
        &self,
        _company: &Company,
        start: NaiveDate,
        end: NaiveDate,
        _kind: FilingKind,
    ) -> Result<Vec<FilingEntry>> {
        Ok(self
            .filings
            .iter()
            .filter(|f| {
                NaiveDate::parse_from_str(&f.rcept_dt, "%Y%m%d")
                    .is_ok_and(|d| d >= start && d <= end)
            })
            .cloned()
            .collect())
    }

    async fn financial_statement(
        &self,
        _company: &Company,
        year: i32,
        report: ReportCode,
    ) -> Result<Option<Vec<RawFilingRow>>> {
        if self.failing_statements.contains(&(year, report)) {
            return Err(DataError::Network("connection reset".to_string()));
        }
        Ok(self.statements.get(&(year, report)).cloned())
    }

    async fn dividend_record(&self, _company: &Company, year: i32) -> Result<Option<DividendRecord>> {
        Ok(self.dividends.get(&year).cloned())
    }

    async fn sub_documents(&self, rcept_no: &str, text_match: &str) -> Result<Vec<SubDocument>> {
        let mut sections = self.sections.get(rcept_no).cloned().unwrap_or_default();
        sections.sort_by_key(|s| !s.title.contains(text_match));
        Ok(sections)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakePrices {
    pub(crate) closes: Vec<DailyClose>,
    pub(crate) failing_years: HashSet<i32>,
}

impl FakePrices {
    pub(crate) fn with_close(mut self, date: NaiveDate, close: f64) -> Self {
        self.closes.push(DailyClose { date, close });
        self
    }

    pub(crate) fn with_failing_year(mut self, year: i32) -> Self {
        self.failing_years.insert(year);
        self
    }
}

impl DataProvider for FakePrices {
    fn name(&self) -> &str {
        "fake prices"
    }

    fn description(&self) -> &str {
        "canned closes"
    }
}

#[async_trait]
impl PriceProvider for FakePrices {
    async fn price_history(
        &self,
        _ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>> {
        if self.failing_years.contains(&chrono::Datelike::year(&start)) {
            return Err(DataError::Network("timeout".to_string()));
        }
        let mut closes: Vec<DailyClose> = self
            .closes
            .iter()
            .filter(|c| c.date >= start && c.date <= end)
            .copied()
            .collect();
        closes.sort_by_key(|c| c.date);
        Ok(closes)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDocuments {
    pub(crate) documents: HashMap<String, HttpDocument>,
}

impl FakeDocuments {
    pub(crate) fn with_document(mut self, url: &str, status: u16, body: &str) -> Self {
        self.documents.insert(
            url.to_string(),
            HttpDocument {
                status,
                body: body.to_string(),
            },
        );
        self
    }
}

impl DataProvider for FakeDocuments {
    fn name(&self) -> &str {
        "fake documents"
    }

    fn description(&self) -> &str {
        "canned documents"
    }
}

#[async_trait]
impl DocumentFetcher for FakeDocuments {
    async fn fetch_document(&self, url: &str) -> Result<HttpDocument> {
        Ok(self.documents.get(url).cloned().unwrap_or(HttpDocument {
            status: 404,
            body: String::new(),
        }))
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDirectory {
    pub(crate) entries: Vec<CorpEntry>,
    pub(crate) calls: AtomicUsize,
}

impl FakeDirectory {
    pub(crate) fn with_entry(mut self, corp_code: &str, name: &str, stock_code: Option<&str>) -> Self {
        self.entries.push(CorpEntry {
            corp_code: corp_code.to_string(),
            corp_name: name.to_string(),
            stock_code: stock_code.map(str::to_string),
            modify_date: None,
        });
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataProvider for FakeDirectory {
    fn name(&self) -> &str {
        "fake directory"
    }

    fn description(&self) -> &str {
        "canned directory"
    }
}

#[async_trait]
impl DirectoryProvider for FakeDirectory {
    async fn corporate_directory(&self) -> Result<Vec<CorpEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.clone())
    }
}
