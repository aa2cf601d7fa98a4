//! Rule-based row selection.
//!
//! A [`RuleSet`] maps field names to required substrings. A row matches a rule set
//! when every named field exists on the row and contains its substring. An empty
//! rule set matches nothing.

use finstate_core::{DividendItem, RawFilingRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// A record whose fields can be tested by a [`RuleSet`].
pub trait FieldSource {
    /// Returns the named field, or `None` if the record does not carry it.
    fn field(&self, name: &str) -> Option<&str>;
}

impl FieldSource for RawFilingRow {
    fn field(&self, name: &str) -> Option<&str> {
        Self::field(self, name)
    }
}

impl FieldSource for DividendItem {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

/// Required substrings keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(BTreeMap<String, String>);

impl RuleSet {
    /// Creates a rule set from `(field, substring)` pairs.
    #[must_use]
    pub fn new<K, V>(conditions: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            conditions
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the required substring for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns true if the rule set has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if every condition holds for `row`.
    pub fn matches<R: FieldSource + ?Sized>(&self, row: &R) -> bool {
        !self.0.is_empty()
            && self
                .0
                .iter()
                .all(|(field, needle)| row.field(field).is_some_and(|v| v.contains(needle.as_str())))
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditions: Vec<String> = self
            .0
            .iter()
            .map(|(field, needle)| format!("{field} ~ '{needle}'"))
            .collect();
        write!(f, "{{{}}}", conditions.join(" & "))
    }
}

/// Returns the rows selected by the first rule set that matches at least one row.
///
/// Rule sets are tried in order. `None` means no rule set matched anything.
pub fn match_rows<'a, R: FieldSource>(rows: &'a [R], rule_sets: &[RuleSet]) -> Option<Vec<&'a R>> {
    for rule_set in rule_sets {
        let matched: Vec<&R> = rows.iter().filter(|row| rule_set.matches(*row)).collect();
        if !matched.is_empty() {
            return Some(matched);
        }
        debug!(rule = %rule_set, "No row satisfies rule");
    }
    None
}
