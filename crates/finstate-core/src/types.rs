//! Core data types for disclosure data.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Ticker`] - KRX stock code
//! - [`Company`] - A listed company resolved from the directory
//! - [`CorpEntry`] - One corporate directory record
//! - [`RawFilingRow`] - One row of a full financial statement filing
//! - [`DividendRecord`] - Dividend matters section of an annual report
//! - [`FilingEntry`] - One entry of the disclosure index
//! - [`SubDocument`] - A section of a filing viewable as HTML
//! - [`DailyClose`] - Daily closing price
//! - [`HttpDocument`] - Raw document fetched over HTTP

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A KRX stock code (e.g. `005930`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Creates a new ticker, trimming surrounding whitespace.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A listed company with the identifiers every provider needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Company name as registered with the regulator.
    pub name: String,
    /// Eight digit corporate code used by the filing system.
    pub corp_code: String,
    /// Market ticker.
    pub ticker: Ticker,
}

impl Company {
    /// Creates a new company.
    #[must_use]
    pub fn new(name: impl Into<String>, corp_code: impl Into<String>, ticker: Ticker) -> Self {
        Self {
            name: name.into(),
            corp_code: corp_code.into(),
            ticker,
        }
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.name, self.ticker)
    }
}

/// One record of the corporate directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpEntry {
    /// Eight digit corporate code.
    pub corp_code: String,
    /// Company name.
    pub corp_name: String,
    /// Stock code, present only for listed companies.
    pub stock_code: Option<String>,
    /// Last modification date of the record (`YYYYMMDD`).
    pub modify_date: Option<String>,
}

impl CorpEntry {
    /// Returns the listed company for this record, if it has a stock code.
    #[must_use]
    pub fn to_company(&self) -> Option<Company> {
        let stock_code = self.stock_code.as_deref()?.trim();
        if stock_code.is_empty() {
            return None;
        }
        Some(Company::new(
            self.corp_name.trim(),
            self.corp_code.trim(),
            Ticker::new(stock_code),
        ))
    }
}

/// One row of a full financial statement filing.
///
/// Field names follow the OpenDART `fnlttSinglAcntAll` response. Amount fields are
/// kept as the provider's strings: `None` when the filing does not report that
/// period at all, an empty string when the period is reported without a value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFilingRow {
    /// Receipt number of the filing.
    #[serde(default)]
    pub rcept_no: String,
    /// Statement division (`BS`, `IS`, `CIS`, `CF`, `SCE`).
    #[serde(default)]
    pub sj_div: String,
    /// Statement name.
    #[serde(default)]
    pub sj_nm: String,
    /// Taxonomy account identifier (e.g. `ifrs-full_Revenue`).
    #[serde(default)]
    pub account_id: String,
    /// Account name as printed in the filing.
    #[serde(default)]
    pub account_nm: String,
    /// Account detail, the context path for equity changes.
    #[serde(default)]
    pub account_detail: String,
    /// Current period amount.
    #[serde(default)]
    pub thstrm_amount: Option<String>,
    /// Prior period amount.
    #[serde(default)]
    pub frmtrm_amount: Option<String>,
    /// Amount two periods prior.
    #[serde(default)]
    pub bfefrmtrm_amount: Option<String>,
    /// Reporting currency.
    #[serde(default)]
    pub currency: String,
}

impl RawFilingRow {
    /// Returns the named field, as used by account match rules.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "rcept_no" => Some(&self.rcept_no),
            "sj_div" => Some(&self.sj_div),
            "sj_nm" => Some(&self.sj_nm),
            "account_id" => Some(&self.account_id),
            "account_nm" => Some(&self.account_nm),
            "account_detail" => Some(&self.account_detail),
            "currency" => Some(&self.currency),
            "thstrm_amount" => self.thstrm_amount.as_deref(),
            "frmtrm_amount" => self.frmtrm_amount.as_deref(),
            "bfefrmtrm_amount" => self.bfefrmtrm_amount.as_deref(),
            _ => None,
        }
    }

    /// Returns the amount reported `periods_back` periods before the filing period.
    ///
    /// `0` is the current period, `1` the prior one and `2` the one before that.
    #[must_use]
    pub fn amount(&self, periods_back: usize) -> Option<&str> {
        match periods_back {
            0 => self.thstrm_amount.as_deref(),
            1 => self.frmtrm_amount.as_deref(),
            2 => self.bfefrmtrm_amount.as_deref(),
            _ => None,
        }
    }
}

/// One item of a dividend matters section, keyed by field name
/// (`se`, `stock_knd`, `thstrm`, `frmtrm`, `lwfr`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DividendItem(BTreeMap<String, String>);

impl DividendItem {
    /// Creates an item from field/value pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the named field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

/// Dividend matters reported in one annual filing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendRecord {
    /// Items of the section, one per metric and stock kind.
    #[serde(default)]
    pub list: Vec<DividendItem>,
}

/// One entry of the disclosure index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingEntry {
    /// Corporate code of the filer.
    #[serde(default)]
    pub corp_code: String,
    /// Company name.
    #[serde(default)]
    pub corp_name: String,
    /// Report title (e.g. `사업보고서 (2020.12)`).
    #[serde(default)]
    pub report_nm: String,
    /// Receipt number.
    #[serde(default)]
    pub rcept_no: String,
    /// Receipt date (`YYYYMMDD`).
    #[serde(default)]
    pub rcept_dt: String,
    /// Remarks (`연` marks filings that include consolidated statements).
    #[serde(default)]
    pub rm: String,
}

/// A section of a filing that can be fetched as an HTML page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDocument {
    /// Section title.
    pub title: String,
    /// Viewer URL of the section.
    pub url: String,
}

/// Closing price of one trading day.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    /// Trading date.
    pub date: NaiveDate,
    /// Closing price.
    pub close: f64,
}

/// A document fetched over HTTP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpDocument {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl HttpDocument {
    /// Returns true for a 200 response.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }
}
