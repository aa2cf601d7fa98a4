//! Report period and filing kind definitions.
//!
//! This module defines [`ReportCode`] for the four periodic filings a listed
//! company submits each year, [`PeriodKey`] for indexing report rows, and
//! [`FilingKind`] for filtering the filing index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Periodic filing kind, identified on OpenDART by its `reprt_code`.
///
/// Variant order is the order in which the filings cover a fiscal year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReportCode {
    /// First quarter report (`11013`).
    FirstQuarter,
    /// Half-year report (`11012`).
    HalfYear,
    /// Third quarter report (`11014`).
    ThirdQuarter,
    /// Annual business report (`11011`).
    Annual,
}

impl ReportCode {
    /// All report codes in fiscal order.
    pub const QUARTERLY: [Self; 4] = [
        Self::FirstQuarter,
        Self::HalfYear,
        Self::ThirdQuarter,
        Self::Annual,
    ];

    /// Returns the OpenDART `reprt_code` for this filing.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FirstQuarter => "11013",
            Self::HalfYear => "11012",
            Self::ThirdQuarter => "11014",
            Self::Annual => "11011",
        }
    }

    /// Returns the quarter label used in period keys (`1Q`..`4Q`).
    #[must_use]
    pub const fn quarter_label(&self) -> &'static str {
        match self {
            Self::FirstQuarter => "1Q",
            Self::HalfYear => "2Q",
            Self::ThirdQuarter => "3Q",
            Self::Annual => "4Q",
        }
    }

    /// Parses an OpenDART `reprt_code`.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::QUARTERLY.into_iter().find(|r| r.code() == code)
    }
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index of one report row: a year, or a year and quarter.
///
/// Ordering is chronological; a table holds only one of the two variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PeriodKey {
    /// A fiscal year.
    Year(i32),
    /// A fiscal year and the filing that covers it.
    Quarter {
        /// Fiscal year.
        year: i32,
        /// Filing covering the quarter.
        report: ReportCode,
    },
}

impl PeriodKey {
    /// Returns the fiscal year of this period.
    #[must_use]
    pub const fn year(&self) -> i32 {
        match self {
            Self::Year(year) | Self::Quarter { year, .. } => *year,
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::Quarter { year, report } => write!(f, "{year}.{}", report.quarter_label()),
        }
    }
}

/// Filing category used to filter the disclosure index (`pblntf_ty`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingKind {
    /// Periodic reports (annual, half-year, quarterly).
    #[default]
    Periodic,
    /// Major event reports.
    MajorEvent,
    /// Securities issuance disclosures.
    Issuance,
    /// Shareholding disclosures.
    Shareholding,
}

impl FilingKind {
    /// Returns the OpenDART `pblntf_ty` code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Periodic => "A",
            Self::MajorEvent => "B",
            Self::Issuance => "C",
            Self::Shareholding => "D",
        }
    }
}
