//! Provider traits for fetching disclosure data.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`FilingProvider`] - Financial statements, dividend matters and the filing index
//! - [`PriceProvider`] - Daily closing prices
//! - [`DirectoryProvider`] - Bulk corporate directory
//! - [`DocumentFetcher`] - Raw HTML documents
//!
//! Methods that look up a single period return `Result<Option<T>>`: `Ok(Some(_))`
//! when data was found, `Ok(None)` when the provider answered but has nothing for
//! that period, and `Err(_)` when the fetch itself failed.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt::Debug;

use crate::{
    error::Result,
    period::{FilingKind, ReportCode},
    types::{
        Company, CorpEntry, DailyClose, DividendRecord, FilingEntry, HttpDocument, RawFilingRow,
        SubDocument, Ticker,
    },
};

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "OpenDART").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider for regulatory filings.
#[async_trait]
pub trait FilingProvider: DataProvider {
    /// Lists filings of `company` submitted between `start` and `end` (inclusive).
    async fn list_filings(
        &self,
        company: &Company,
        start: NaiveDate,
        end: NaiveDate,
        kind: FilingKind,
    ) -> Result<Vec<FilingEntry>>;

    /// Fetches every row of the full financial statement filed for `year`.
    async fn financial_statement(
        &self,
        company: &Company,
        year: i32,
        report: ReportCode,
    ) -> Result<Option<Vec<RawFilingRow>>>;

    /// Fetches the dividend matters of the annual report for `year`.
    async fn dividend_record(&self, company: &Company, year: i32)
    -> Result<Option<DividendRecord>>;

    /// Lists the sections of a filing, best matches for `text_match` first.
    async fn sub_documents(&self, rcept_no: &str, text_match: &str) -> Result<Vec<SubDocument>>;
}

/// Provider for daily price history.
#[async_trait]
pub trait PriceProvider: DataProvider {
    /// Fetches daily closes between `start` and `end` (inclusive), oldest first.
    async fn price_history(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>>;

    /// Fetches the last available close between `start` and `end`.
    ///
    /// Default implementation takes the last row of [`price_history`](Self::price_history).
    async fn last_close(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<DailyClose>> {
        let history = self.price_history(ticker, start, end).await?;
        Ok(history.into_iter().max_by_key(|bar| bar.date))
    }
}

/// Provider for the bulk corporate directory.
#[async_trait]
pub trait DirectoryProvider: DataProvider {
    /// Fetches every registered company.
    async fn corporate_directory(&self) -> Result<Vec<CorpEntry>>;
}

/// Fetcher for raw documents referenced by filings.
#[async_trait]
pub trait DocumentFetcher: DataProvider {
    /// Fetches `url`, returning the status code and body for any HTTP response.
    async fn fetch_document(&self, url: &str) -> Result<HttpDocument>;
}
