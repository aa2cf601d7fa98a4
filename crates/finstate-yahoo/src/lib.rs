#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finstate/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance price provider.
//!
//! This crate provides a Yahoo Finance provider implementing the [`DataProvider`]
//! and [`PriceProvider`] traits from `finstate-core`.
//!
//! # Features
//!
//! - Daily closes from Yahoo Finance's chart API
//! - KOSPI/KOSDAQ market suffix resolution for bare KRX stock codes
//! - Built-in rate limiting (1 request per second by default)
//!
//! # Example
//!
//! ```no_run
//! use finstate_yahoo::YahooProvider;
//! use finstate_core::{PriceProvider, Ticker};
//! use chrono::NaiveDate;
//!
//! # async fn example() -> finstate_core::Result<()> {
//! let provider = YahooProvider::new();
//! let ticker = Ticker::new("005930");
//! let start = NaiveDate::from_ymd_opt(2020, 12, 15).unwrap();
//! let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
//!
//! if let Some(close) = provider.last_close(&ticker, start, end).await? {
//!     println!("{}: {}", close.date, close.close);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use finstate_core::{DailyClose, DataError, DataProvider, PriceProvider, Result, Ticker};
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Yahoo Finance chart API base URL.
const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Default rate limit delay in milliseconds.
const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Market suffixes tried for bare KRX stock codes, in order.
const KRX_SUFFIXES: [&str; 2] = [".KS", ".KQ"];

/// Korea Standard Time offset, used when the response carries none.
const KST_OFFSET_SECS: i64 = 9 * 3600;

/// Yahoo Finance price provider.
///
/// Implements [`DataProvider`] and [`PriceProvider`].
#[derive(Debug)]
pub struct YahooProvider {
    client: reqwest::Client,
    rate_limit_ms: u64,
    last_request_time: AtomicU64,
    resolved_suffixes: RwLock<HashMap<String, &'static str>>,
}

/// Outcome of one chart request.
enum ChartOutcome {
    Closes(Vec<DailyClose>),
    UnknownSymbol,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    ///
    /// Uses built-in rate limiting of 1 request per second.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rate_limit(Duration::from_millis(DEFAULT_RATE_LIMIT_MS))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    ///
    /// Rate limiting is still applied.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            last_request_time: AtomicU64::new(0),
            resolved_suffixes: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new Yahoo Finance provider with custom rate limiting.
    #[must_use]
    pub fn with_rate_limit(rate_limit: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            rate_limit_ms: rate_limit.as_millis() as u64,
            last_request_time: AtomicU64::new(0),
            resolved_suffixes: RwLock::new(HashMap::new()),
        }
    }

    /// Apply rate limiting before making a request.
    async fn apply_rate_limit(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let last = self.last_request_time.load(Ordering::Relaxed);
        let elapsed = now.saturating_sub(last);

        if elapsed < self.rate_limit_ms {
            let wait_time = self.rate_limit_ms - elapsed;
            debug!("Rate limiting: waiting {}ms", wait_time);
            sleep(Duration::from_millis(wait_time)).await;
        }

        self.last_request_time.store(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            Ordering::Relaxed,
        );
    }

    /// Symbols to try for a ticker, the previously resolved market first.
    async fn candidate_symbols(&self, ticker: &Ticker) -> Vec<String> {
        let code = ticker.as_str();
        if code.contains('.') {
            return vec![code.to_string()];
        }

        if let Some(suffix) = self.resolved_suffixes.read().await.get(code) {
            return vec![format!("{}{}", code, suffix)];
        }

        KRX_SUFFIXES
            .iter()
            .map(|suffix| format!("{}{}", code, suffix))
            .collect()
    }

    /// Remember which market answered for a bare stock code.
    async fn remember_suffix(&self, ticker: &Ticker, symbol: &str) {
        let Some(suffix) = KRX_SUFFIXES.iter().find(|s| symbol.ends_with(**s)) else {
            return;
        };
        if ticker.as_str().contains('.') {
            return;
        }
        self.resolved_suffixes
            .write()
            .await
            .insert(ticker.as_str().to_string(), *suffix);
    }

    /// Build the chart API URL for a symbol and date range.
    fn build_chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp() - KST_OFFSET_SECS)
            .unwrap_or(0);

        let end_ts = end
            .and_hms_opt(23, 59, 59)
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp() - KST_OFFSET_SECS)
            .unwrap_or(0);

        format!(
            "{}/{}?period1={}&period2={}&interval=1d",
            CHART_API_URL, symbol, start_ts, end_ts
        )
    }

    /// Fetch daily closes for one fully qualified symbol.
    async fn fetch_chart(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ChartOutcome> {
        self.apply_rate_limit().await;

        let url = self.build_chart_url(symbol, start, end);
        debug!("Fetching daily closes: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                provider: "Yahoo Finance".to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(ChartOutcome::UnknownSymbol);
        }

        if !response.status().is_success() {
            return Err(DataError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        let chart_response: ChartResponse = response
            .json()
            .await
            .map_err(|e| DataError::Parse(e.to_string()))?;

        parse_chart_response(chart_response, start, end)
    }
}

/// Parse a chart response into daily closes within `[start, end]`, oldest first.
///
/// Days without a close (trading halts) are skipped.
fn parse_chart_response(
    response: ChartResponse,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ChartOutcome> {
    if let Some(error) = response.chart.error {
        if error.code == "Not Found" {
            return Ok(ChartOutcome::UnknownSymbol);
        }
        return Err(DataError::Other(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let Some(result) = response.chart.result.into_iter().flatten().next() else {
        return Ok(ChartOutcome::UnknownSymbol);
    };

    let offset = result
        .meta
        .and_then(|m| m.gmtoffset)
        .unwrap_or(KST_OFFSET_SECS);
    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut bars: Vec<DailyClose> = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let date = Utc.timestamp_opt(ts + offset, 0).single()?.date_naive();
            Some(DailyClose {
                date,
                close: close?,
            })
        })
        .filter(|bar| bar.date >= start && bar.date <= end)
        .collect();
    bars.sort_by_key(|bar| bar.date);

    Ok(ChartOutcome::Closes(bars))
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn description(&self) -> &str {
        "Yahoo Finance daily closes for KOSPI and KOSDAQ listings"
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn price_history(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>> {
        if start > end {
            return Err(DataError::InvalidParameter(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }

        for symbol in self.candidate_symbols(ticker).await {
            match self.fetch_chart(&symbol, start, end).await? {
                ChartOutcome::Closes(bars) => {
                    self.remember_suffix(ticker, &symbol).await;
                    return Ok(bars);
                }
                ChartOutcome::UnknownSymbol => {
                    debug!("Yahoo Finance does not list {}", symbol);
                }
            }
        }

        warn!(ticker = %ticker, "No market lists this ticker");
        Err(DataError::CompanyNotFound(ticker.to_string()))
    }
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// Chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
