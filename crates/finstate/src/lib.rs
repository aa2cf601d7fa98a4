#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finstate/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Company reports from Korean disclosure data.
//!
//! This crate re-exports the core types and provider implementations, and
//! provides the report pipeline:
//!
//! - [`matcher`] - Rule-based selection of statement rows
//! - [`statement`] - Yearly and quarterly statement tables
//! - [`dividend`], [`price`], [`shares`] - Year-indexed auxiliary series
//! - [`merge`] - Joined yearly report with ROE and BPS
//! - [`directory`] - Company name and ticker resolution
//!
//! # Features
//!
//! - `dart` - OpenDART filing provider
//! - `yahoo` - Yahoo Finance price provider
//! - `cache-sqlite` - SQLite-based directory cache

// Core types and traits
pub use finstate_core::*;

// Cache implementations
#[cfg(feature = "cache-sqlite")]
pub use finstate_cache::SqliteCache;
pub use finstate_cache::InMemoryCache;

// Providers
#[cfg(feature = "dart")]
pub use finstate_dart::OpenDartProvider;
#[cfg(feature = "yahoo")]
pub use finstate_yahoo::YahooProvider;

pub mod config;
pub mod directory;
pub mod dividend;
pub mod format;
pub mod matcher;
pub mod merge;
pub mod pipeline;
pub mod price;
pub mod shares;
pub mod statement;

#[cfg(test)]
mod fixtures;

pub use config::{AccountDefinition, DateWindow, DividendCriterion, MonthDay, ReportConfig};
pub use directory::CorpDirectory;
pub use matcher::{FieldSource, RuleSet, match_rows};
pub use merge::ReportParts;
pub use pipeline::{ReportPipeline, ReportSources, build_quarterly_report, build_yearly_report};
