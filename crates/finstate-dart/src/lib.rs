#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finstate/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! OpenDART data provider for Korean financial disclosures.
//!
//! This crate provides access to the Financial Supervisory Service's OpenDART API:
//!
//! - Full financial statements per report (annual, half-year, quarters)
//! - Dividend matters of annual reports
//! - Disclosure index search by filing kind
//! - Bulk corporate directory (corp code to stock code mapping)
//! - Section index of filings, scraped from the DART viewer
//!
//! # Example
//!
//! ```no_run
//! use finstate_dart::OpenDartProvider;
//! use finstate_core::{Company, FilingProvider, ReportCode, Ticker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenDartProvider::from_env()?;
//!
//!     let company = Company::new("삼성전자", "00126380", Ticker::new("005930"));
//!     if let Some(rows) = provider
//!         .financial_statement(&company, 2020, ReportCode::Annual)
//!         .await?
//!     {
//!         println!("{} statement rows", rows.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

mod corp_code;
mod viewer;

use async_trait::async_trait;
use chrono::NaiveDate;
use finstate_core::{
    Company, CorpEntry, DataError, DataProvider, DirectoryProvider, DividendItem, DividendRecord,
    DocumentFetcher, FilingEntry, FilingKind, FilingProvider, HttpDocument, RawFilingRow,
    ReportCode, Result, SubDocument,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// OpenDART API base URL
const DART_BASE_URL: &str = "https://opendart.fss.or.kr/api";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "DART_API_KEY";

/// Default rate limit: 10 requests per second
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Page size for disclosure index searches (the API maximum)
const LIST_PAGE_COUNT: u32 = 100;

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

const PROVIDER_NAME: &str = "OpenDART";

/// Rate limiter spacing out requests to the API
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// OpenDART data provider.
///
/// Implements [`FilingProvider`], [`DirectoryProvider`] and [`DocumentFetcher`].
/// Requests are spaced by a shared rate limiter.
pub struct OpenDartProvider {
    client: reqwest::Client,
    api_key: String,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl OpenDartProvider {
    /// Create a new OpenDART provider with the given API key.
    ///
    /// # Example
    /// ```
    /// use finstate_dart::OpenDartProvider;
    ///
    /// let provider = OpenDartProvider::new("0123456789abcdef0123456789abcdef01234567");
    /// ```
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self::with_client(client, api_key)
    }

    /// Create a new OpenDART provider with a custom HTTP client.
    pub fn with_client(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
        }
    }

    /// Create a provider from the `DART_API_KEY` environment variable.
    ///
    /// # Errors
    /// Returns [`DataError::ProviderNotConfigured`] if the variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(DataError::ProviderNotConfigured(format!(
                "{} requires {} to be set",
                PROVIDER_NAME, API_KEY_ENV
            ))),
        }
    }

    /// Replace the minimum interval between two requests.
    #[must_use]
    pub fn with_rate_limit(mut self, min_interval: Duration) -> Self {
        self.rate_limiter = Arc::new(Mutex::new(RateLimiter::new(min_interval)));
        self
    }

    /// Send a GET request, rate limited, mapping transport failures.
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        self.rate_limiter.lock().await.wait().await;

        debug!("Requesting {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        Ok(response)
    }

    /// Call a JSON endpoint and return its `list`, or `None` when there is no data.
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<DartResponse<T>>> {
        let url = format!("{}/{}", DART_BASE_URL, endpoint);
        let mut query = vec![("crtfc_key", self.api_key.as_str())];
        query.extend_from_slice(params);

        let response = self.get(&url, &query).await?;
        if !response.status().is_success() {
            return Err(DataError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                endpoint
            )));
        }

        let body: DartResponse<T> = response
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("Failed to parse {}: {}", endpoint, e)))?;

        if check_status(&body.status, &body.message)? {
            Ok(Some(body))
        } else {
            Ok(None)
        }
    }
}

impl fmt::Debug for OpenDartProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenDartProvider")
            .field("api_key", &"[REDACTED]")
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// Interpret an OpenDART status code.
///
/// Returns `Ok(true)` for data, `Ok(false)` for "no data" (`013`).
fn check_status(status: &str, message: &str) -> Result<bool> {
    match status {
        "000" => Ok(true),
        "013" => Ok(false),
        "010" | "011" | "012" | "901" => Err(DataError::AuthenticationFailed(format!(
            "{} ({}): {}",
            PROVIDER_NAME, status, message
        ))),
        "020" => Err(DataError::RateLimited {
            provider: PROVIDER_NAME.to_string(),
            retry_after: None,
        }),
        _ => Err(DataError::Api {
            provider: PROVIDER_NAME.to_string(),
            status: status.to_string(),
            message: message.to_string(),
        }),
    }
}

/// Convert one raw `alotMatter` item, keeping every scalar field as a string.
fn dividend_item(value: serde_json::Value) -> Option<DividendItem> {
    let serde_json::Value::Object(map) = value else {
        return None;
    };
    Some(DividendItem::from_pairs(map.into_iter().filter_map(
        |(k, v)| match v {
            serde_json::Value::String(s) => Some((k, s)),
            serde_json::Value::Number(n) => Some((k, n.to_string())),
            _ => None,
        },
    )))
}

impl DataProvider for OpenDartProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Financial statements, dividend matters and filings from the Korean DART system"
    }
}

#[async_trait]
impl FilingProvider for OpenDartProvider {
    async fn list_filings(
        &self,
        company: &Company,
        start: NaiveDate,
        end: NaiveDate,
        kind: FilingKind,
    ) -> Result<Vec<FilingEntry>> {
        if start > end {
            return Err(DataError::InvalidParameter(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }

        let bgn_de = start.format("%Y%m%d").to_string();
        let end_de = end.format("%Y%m%d").to_string();
        let page_count = LIST_PAGE_COUNT.to_string();

        let mut filings = Vec::new();
        let mut page_no = 1u32;
        loop {
            let page = page_no.to_string();
            let params = [
                ("corp_code", company.corp_code.as_str()),
                ("bgn_de", bgn_de.as_str()),
                ("end_de", end_de.as_str()),
                ("pblntf_ty", kind.code()),
                ("page_no", page.as_str()),
                ("page_count", page_count.as_str()),
            ];

            let Some(response) = self.fetch_list::<FilingEntry>("list.json", &params).await?
            else {
                break;
            };
            filings.extend(response.list);

            if page_no >= response.total_page.unwrap_or(1) {
                break;
            }
            page_no += 1;
        }

        debug!(
            corp_code = %company.corp_code,
            "Found {} filings between {} and {}",
            filings.len(),
            start,
            end
        );
        Ok(filings)
    }

    async fn financial_statement(
        &self,
        company: &Company,
        year: i32,
        report: ReportCode,
    ) -> Result<Option<Vec<RawFilingRow>>> {
        let bsns_year = year.to_string();
        let params = [
            ("corp_code", company.corp_code.as_str()),
            ("bsns_year", bsns_year.as_str()),
            ("reprt_code", report.code()),
            ("fs_div", "CFS"),
        ];

        let response = self
            .fetch_list::<RawFilingRow>("fnlttSinglAcntAll.json", &params)
            .await?;

        match response {
            Some(r) if !r.list.is_empty() => Ok(Some(r.list)),
            _ => {
                debug!(corp_code = %company.corp_code, year, report = %report, "No statement filed");
                Ok(None)
            }
        }
    }

    async fn dividend_record(
        &self,
        company: &Company,
        year: i32,
    ) -> Result<Option<DividendRecord>> {
        let bsns_year = year.to_string();
        let params = [
            ("corp_code", company.corp_code.as_str()),
            ("bsns_year", bsns_year.as_str()),
            ("reprt_code", ReportCode::Annual.code()),
        ];

        let response = self
            .fetch_list::<serde_json::Value>("alotMatter.json", &params)
            .await?;

        Ok(response.map(|r| DividendRecord {
            list: r.list.into_iter().filter_map(dividend_item).collect(),
        }))
    }

    async fn sub_documents(&self, rcept_no: &str, text_match: &str) -> Result<Vec<SubDocument>> {
        let response = self.get(viewer::MAIN_URL, &[("rcpNo", rcept_no)]).await?;
        if !response.status().is_success() {
            return Err(DataError::Network(format!(
                "HTTP {} for filing viewer {}",
                response.status(),
                rcept_no
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        let sections = viewer::parse_sections(&html, rcept_no);
        if sections.is_empty() {
            warn!(rcept_no, "Filing viewer page carries no section index");
        }
        Ok(viewer::rank_sections(sections, text_match))
    }
}

#[async_trait]
impl DirectoryProvider for OpenDartProvider {
    async fn corporate_directory(&self) -> Result<Vec<CorpEntry>> {
        let url = format!("{}/corpCode.xml", DART_BASE_URL);
        let response = self
            .get(&url, &[("crtfc_key", self.api_key.as_str())])
            .await?;

        if !response.status().is_success() {
            return Err(DataError::Network(format!(
                "Failed to fetch corporate directory: HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        // Errors come back as a JSON or XML status document instead of a zip.
        if !bytes.starts_with(b"PK") {
            let text = String::from_utf8_lossy(&bytes);
            if let Ok(status) = serde_json::from_str::<DartStatus>(&text) {
                check_status(&status.status, &status.message)?;
            }
            return Err(DataError::Parse(format!(
                "Corporate directory is not a zip archive: {}",
                text.chars().take(200).collect::<String>()
            )));
        }

        let xml = corp_code::unpack_archive(&bytes)?;
        let entries = corp_code::parse_corp_codes(&xml)?;
        debug!("Fetched {} corporate directory entries", entries.len());
        Ok(entries)
    }
}

#[async_trait]
impl DocumentFetcher for OpenDartProvider {
    async fn fetch_document(&self, url: &str) -> Result<HttpDocument> {
        let response = self.get(url, &[]).await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        if status != 200 {
            warn!(url, status, "Document request did not succeed");
        }
        Ok(HttpDocument { status, body })
    }
}

// =============================================================================
// OpenDART API Response Types
// =============================================================================

/// Envelope shared by the JSON endpoints.
#[derive(Debug, Deserialize)]
struct DartResponse<T> {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    total_page: Option<u32>,
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

/// Status-only document returned in place of a download.
#[derive(Debug, Deserialize)]
struct DartStatus {
    status: String,
    #[serde(default)]
    message: String,
}

// =============================================================================
// Tests
// =============================================================================
