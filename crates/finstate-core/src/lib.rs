#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finstate/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for Korean disclosure report providers.
//!
//! This crate provides the foundational abstractions used by the report pipeline:
//!
//! - [`DataProvider`](provider::DataProvider) - Base trait for all providers
//! - [`FilingProvider`](provider::FilingProvider) - Financial statements, dividends, filings
//! - [`PriceProvider`](provider::PriceProvider) - Daily closing prices
//! - [`DirectoryProvider`](provider::DirectoryProvider) - Corporate directory
//! - [`DocumentFetcher`](provider::DocumentFetcher) - Raw HTML sub-documents
//! - [`DirectoryCache`](cache::DirectoryCache) - Caching abstraction for the directory
//! - [`Table`](table::Table) - Period-indexed report table

/// Cache trait for the corporate directory.
pub mod cache;
/// Error types for data operations.
pub mod error;
/// Report period and filing kind definitions.
pub mod period;
/// Provider traits for fetching disclosure data.
pub mod provider;
/// Period-indexed report table.
pub mod table;
/// Core data types (Company, RawFilingRow, DividendRecord, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::DirectoryCache;
pub use error::{DataError, Result};
pub use period::{FilingKind, PeriodKey, ReportCode};
pub use provider::{DataProvider, DirectoryProvider, DocumentFetcher, FilingProvider, PriceProvider};
pub use table::{Table, Value};
pub use types::{
    Company, CorpEntry, DailyClose, DividendItem, DividendRecord, FilingEntry, HttpDocument,
    RawFilingRow, SubDocument, Ticker,
};
