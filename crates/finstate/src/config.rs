//! Report configuration.
//!
//! [`ReportConfig`] carries the account taxonomy, the dividend criteria and the
//! constants the series builders work with. The default configuration is the
//! taxonomy for consolidated K-IFRS filings; a JSON file can replace any part.

use chrono::NaiveDate;
use finstate_core::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::matcher::RuleSet;

/// One canonical account of the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDefinition {
    /// Display name, unique within a taxonomy.
    pub label: String,
    /// Column sort key.
    pub order: u32,
    /// Rule sets tried in order; the first one selecting a row wins.
    pub rules: Vec<RuleSet>,
}

impl AccountDefinition {
    /// Creates an account definition.
    #[must_use]
    pub fn new(label: impl Into<String>, order: u32, rules: Vec<RuleSet>) -> Self {
        Self {
            label: label.into(),
            order,
            rules,
        }
    }
}

/// Selects one item of a dividend matters section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendCriterion {
    /// Column name; defaults to the rule's `se` substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Conditions the item must satisfy.
    pub rule: RuleSet,
}

impl DividendCriterion {
    /// Creates a criterion matching items whose `se` field contains `se`.
    #[must_use]
    pub fn by_se(se: impl Into<String>) -> Self {
        Self {
            label: None,
            rule: RuleSet::new([("se", se.into())]),
        }
    }

    /// Sets an explicit column name.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the column this criterion fills.
    #[must_use]
    pub fn column(&self) -> String {
        self.label
            .clone()
            .or_else(|| self.rule.get("se").map(str::to_string))
            .unwrap_or_else(|| self.rule.to_string())
    }
}

/// A calendar day without a year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    /// Month, 1 to 12.
    pub month: u32,
    /// Day of month.
    pub day: u32,
}

impl MonthDay {
    /// Creates a month/day pair.
    #[must_use]
    pub const fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    /// Returns this day in `year`, or `None` if it does not exist (e.g. Feb 29).
    #[must_use]
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

/// A window of days, `from` in the base year and `to` `to_year_offset` years later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First day of the window.
    pub from: MonthDay,
    /// Last day of the window (inclusive).
    pub to: MonthDay,
    /// Years between `from` and `to`.
    #[serde(default)]
    pub to_year_offset: i32,
}

impl DateWindow {
    /// Returns the concrete window for `year`.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidParameter`] if either end is not a real date.
    pub fn for_year(&self, year: i32) -> Result<(NaiveDate, NaiveDate)> {
        let start = self.from.in_year(year);
        let end = self.to.in_year(year + self.to_year_offset);
        match (start, end) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(DataError::InvalidParameter(format!(
                "Invalid date window {:?} for {}",
                self, year
            ))),
        }
    }
}

/// Settings of the report pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Canonical accounts extracted from statements.
    pub accounts: Vec<AccountDefinition>,
    /// Dividend metrics extracted from dividend matters.
    pub dividend_criteria: Vec<DividendCriterion>,
    /// Extra years of share prices fetched before the report's first year.
    pub price_lookback_years: i32,
    /// Days of each year searched for the year-end close.
    pub price_window: DateWindow,
    /// Submission window of the annual report covering a year.
    pub annual_filing_window: DateWindow,
    /// Divisor applied to amounts in scaled columns.
    pub unit_divisor: f64,
    /// Unit name appended to scaled column names.
    pub unit_suffix: String,
    /// Section title holding the share count table.
    pub share_document_match: String,
    /// Text of the table cell that starts the issued share row.
    pub share_row_marker: String,
    /// Section title linked from quarterly reports.
    pub business_document_match: String,
    /// Name of the quarterly report link column.
    pub report_link_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            accounts: default_accounts(),
            dividend_criteria: vec![
                DividendCriterion::by_se("주당순이익"),
                DividendCriterion::by_se("주당 현금배당금(원)"),
                DividendCriterion::by_se("현금배당수익률(%)"),
            ],
            price_lookback_years: 3,
            price_window: DateWindow {
                from: MonthDay::new(12, 15),
                to: MonthDay::new(12, 31),
                to_year_offset: 0,
            },
            annual_filing_window: DateWindow {
                from: MonthDay::new(12, 1),
                to: MonthDay::new(5, 30),
                to_year_offset: 1,
            },
            unit_divisor: 1e8,
            unit_suffix: "억".to_string(),
            share_document_match: "주식의 총수".to_string(),
            share_row_marker: "발행주식".to_string(),
            business_document_match: "사업의 내용".to_string(),
            report_link_label: "보고서".to_string(),
        }
    }
}

impl ReportConfig {
    /// Replaces the account taxonomy.
    #[must_use]
    pub fn with_accounts(mut self, accounts: Vec<AccountDefinition>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Replaces the dividend criteria.
    #[must_use]
    pub fn with_dividend_criteria(mut self, criteria: Vec<DividendCriterion>) -> Self {
        self.dividend_criteria = criteria;
        self
    }

    /// Sets how many years of prices precede the first report year.
    #[must_use]
    pub fn with_price_lookback_years(mut self, years: i32) -> Self {
        self.price_lookback_years = years;
        self
    }

    /// Sets the divisor and name of the scaled unit.
    #[must_use]
    pub fn with_unit(mut self, divisor: f64, suffix: impl Into<String>) -> Self {
        self.unit_divisor = divisor;
        self.unit_suffix = suffix.into();
        self
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`DataError::Parse`] for malformed JSON and
    /// [`DataError::InvalidParameter`] if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DataError::Parse(format!("Invalid report configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    /// Returns [`DataError::Other`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| DataError::Other(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Checks the taxonomy and constants.
    ///
    /// Labels must be unique, orders distinct, the report link order free, and
    /// both date windows real dates.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidParameter`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let mut labels = HashSet::new();
        let mut orders = HashSet::new();
        for account in &self.accounts {
            if account.label.trim().is_empty() {
                return Err(DataError::InvalidParameter(
                    "Account label must not be empty".to_string(),
                ));
            }
            if !labels.insert(account.label.as_str()) {
                return Err(DataError::InvalidParameter(format!(
                    "Duplicate account label '{}'",
                    account.label
                )));
            }
            if !orders.insert(account.order) {
                return Err(DataError::InvalidParameter(format!(
                    "Duplicate account order {} ('{}')",
                    account.order, account.label
                )));
            }
        }

        let mut columns = HashSet::new();
        for criterion in &self.dividend_criteria {
            if criterion.rule.is_empty() {
                return Err(DataError::InvalidParameter(format!(
                    "Dividend criterion '{}' has no conditions",
                    criterion.column()
                )));
            }
            if !columns.insert(criterion.column()) {
                return Err(DataError::InvalidParameter(format!(
                    "Duplicate dividend column '{}'",
                    criterion.column()
                )));
            }
        }

        if !(self.unit_divisor.is_finite() && self.unit_divisor > 0.0) {
            return Err(DataError::InvalidParameter(format!(
                "Unit divisor must be positive, got {}",
                self.unit_divisor
            )));
        }
        if self.price_lookback_years < 0 {
            return Err(DataError::InvalidParameter(format!(
                "Price lookback must not be negative, got {}",
                self.price_lookback_years
            )));
        }

        // 2001 is not a leap year, so Feb 29 windows are rejected here.
        self.price_window.for_year(2001)?;
        self.annual_filing_window.for_year(2001)?;
        Ok(())
    }

    /// Returns the account with `label`.
    #[must_use]
    pub fn account(&self, label: &str) -> Option<&AccountDefinition> {
        self.accounts.iter().find(|a| a.label == label)
    }

    /// Returns the order given to the quarterly report link column.
    #[must_use]
    pub fn report_link_order(&self) -> u32 {
        self.accounts.iter().map(|a| a.order).max().unwrap_or(0) + 1
    }

    /// Returns the name of the scaled column for `account`.
    #[must_use]
    pub fn scaled_column(&self, account: &AccountDefinition) -> String {
        format!("{}.{}({})", account.order, account.label, self.unit_suffix)
    }

    /// Returns the name of the quarterly report link column.
    #[must_use]
    pub fn report_link_column(&self) -> String {
        format!("{}.{}", self.report_link_order(), self.report_link_label)
    }
}

/// Label of the controlling-interest net income account.
pub const NET_INCOME: &str = "지배기업소유주당기순이익";

/// Label of the controlling-interest equity account.
pub const EQUITY: &str = "지배기업소유주자본";

fn rule(conditions: &[(&str, &str)]) -> RuleSet {
    RuleSet::new(conditions.iter().copied())
}

fn default_accounts() -> Vec<AccountDefinition> {
    let nm = |name: &str| rule(&[("account_nm", name)]);
    let id = |account_id: &str| rule(&[("account_id", account_id)]);
    let nm_detail = |name: &str, detail: &str| {
        rule(&[("account_nm", name), ("account_detail", detail)])
    };

    vec![
        AccountDefinition::new(
            "매출액",
            1,
            vec![
                nm("매출액"),
                id("ifrs-full_Revenue"),
                id("ifrs_Revenue"),
                nm("영업수익"),
            ],
        ),
        AccountDefinition::new(
            NET_INCOME,
            2,
            vec![
                id("full_ProfitLossAttributableToOwnersOfParent"),
                nm_detail("당기순이익", "지배기업의 소유주"),
                nm_detail("당기순이익", "지배기업 소유주"),
                nm_detail("당기순이익", "지배지분 | 이익잉여금"),
                nm_detail("분기순이익", "지배기업의 소유주"),
                nm_detail("분기순이익", "지배기업 소유주"),
                nm_detail("분기순이익", "지배지분 | 이익잉여금"),
                nm_detail("분기순손실", "지배기업의 소유주"),
                nm_detail("반기순이익", "지배기업의 소유주"),
                nm_detail("반기순이익", "지배기업 소유주"),
                nm_detail("반기순이익", "지배지분 | 이익잉여금"),
                rule(&[("account_id", "ifrs_ProfitLoss"), ("account_detail", "지배기업의 소유주")]),
                rule(&[("account_id", "ifrs_ProfitLoss"), ("account_detail", "지배기업 소유주")]),
            ],
        ),
        AccountDefinition::new(
            EQUITY,
            3,
            vec![
                id("full_EquityAttributableToOwnersOfParent"),
                id("ifrs_EquityAttributableToOwnersOfParent"),
            ],
        ),
        AccountDefinition::new(
            "무형자산",
            4,
            vec![id("full_IntangibleAssetsOtherThanGoodwill"), nm("무형자산")],
        ),
        AccountDefinition::new(
            "재고자산",
            5,
            vec![id("full_Inventories"), nm("재고자산")],
        ),
        AccountDefinition::new(
            "매출채권",
            6,
            vec![
                id("ShortTermTradeReceivable"),
                id("TradeAndOtherCurrentReceivables"),
                nm("매출채권"),
            ],
        ),
        AccountDefinition::new(
            "부채총계",
            7,
            vec![id("full_Liabilities"), nm("부채총계")],
        ),
    ]
}
