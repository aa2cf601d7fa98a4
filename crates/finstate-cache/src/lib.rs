#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finstate/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Corporate directory caches.
//!
//! This crate provides implementations of the [`DirectoryCache`] trait from `finstate-core`:
//!
//! - [`InMemoryCache`] - Process-lifetime in-memory cache
//! - [`SqliteCache`] - Persistent SQLite-based cache (requires `sqlite` feature)

/// In-memory cache implementation.
pub mod memory;

/// SQLite-based cache implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use finstate_core::DirectoryCache;

pub use memory::InMemoryCache;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCache;
