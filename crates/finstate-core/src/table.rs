//! Period-indexed report table.
//!
//! A [`Table`] is an ordered list of rows keyed by [`PeriodKey`] with named
//! columns. A cell may be missing; missing cells stay distinct from zero until
//! [`Table::fill_missing`] is called.

use polars::prelude::{Column, DataFrame};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::{
    error::{DataError, Result},
    period::PeriodKey,
};

/// A single table cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Integer amount (base currency units, share counts).
    Int(i64),
    /// Floating point metric.
    Float(f64),
    /// Preformatted text.
    Text(String),
}

impl Value {
    /// Returns the numeric value, or `None` for text.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Returns the text value, or `None` for numbers.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) | Self::Float(_) => None,
        }
    }

    /// Returns true for integer and float cells.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Row {
    key: PeriodKey,
    cells: BTreeMap<String, Value>,
}

/// Rows keyed by period with an ordered set of named columns.
///
/// Rows keep insertion order until [`sort_by_period`](Self::sort_by_period) is
/// called. Duplicate keys are allowed until
/// [`dedup_keep_first`](Self::dedup_keep_first) collapses them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the column names in display order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row keys in row order.
    pub fn keys(&self) -> impl Iterator<Item = PeriodKey> + '_ {
        self.rows.iter().map(|row| row.key)
    }

    /// Returns true if the table has the named column.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Adds an empty column if it does not exist yet.
    pub fn add_column(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.has_column(&name) {
            self.columns.push(name);
        }
    }

    /// Appends a row. Unknown column names are added in the order they appear.
    pub fn push_row<K>(&mut self, key: PeriodKey, cells: impl IntoIterator<Item = (K, Value)>)
    where
        K: Into<String>,
    {
        let mut row = Row {
            key,
            cells: BTreeMap::new(),
        };
        for (name, value) in cells {
            let name = name.into();
            self.add_column(name.clone());
            row.cells.insert(name, value);
        }
        self.rows.push(row);
    }

    /// Returns the cell of the first row with `key`.
    #[must_use]
    pub fn get(&self, key: &PeriodKey, column: &str) -> Option<&Value> {
        self.rows
            .iter()
            .find(|row| &row.key == key)
            .and_then(|row| row.cells.get(column))
    }

    /// Returns the cells of a column in row order.
    #[must_use]
    pub fn column(&self, name: &str) -> Vec<Option<&Value>> {
        self.rows.iter().map(|row| row.cells.get(name)).collect()
    }

    /// Sets a column from values given in row order, adding it if needed.
    ///
    /// `None` leaves the cell missing. Values beyond the row count are ignored.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Option<Value>>) {
        let name = name.into();
        self.add_column(name.clone());
        for (row, value) in self.rows.iter_mut().zip(values) {
            match value {
                Some(value) => {
                    row.cells.insert(name.clone(), value);
                }
                None => {
                    row.cells.remove(&name);
                }
            }
        }
    }

    /// Derives `target` from `source` cell by cell. Missing source cells stay missing.
    pub fn derive_column(
        &mut self,
        source: &str,
        target: impl Into<String>,
        f: impl Fn(&Value) -> Option<Value>,
    ) {
        let values = self
            .rows
            .iter()
            .map(|row| row.cells.get(source).and_then(&f))
            .collect();
        self.set_column(target, values);
    }

    /// Removes a column and its cells. Unknown names are ignored.
    pub fn drop_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for row in &mut self.rows {
            row.cells.remove(name);
        }
    }

    /// Removes several columns.
    pub fn drop_columns<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.drop_column(name);
        }
    }

    /// Reorders columns by a sort key derived from the column name (stable).
    pub fn sort_columns_by_key<K: Ord>(&mut self, mut f: impl FnMut(&str) -> K) {
        self.columns.sort_by_cached_key(|c| f(c.as_str()));
    }

    /// Sorts rows by period key. Rows with equal keys keep their relative order.
    pub fn sort_by_period(&mut self) {
        self.rows.sort_by_key(|row| row.key);
    }

    /// Collapses rows with duplicate keys, keeping the earliest-inserted row.
    ///
    /// Returns the number of rows removed.
    pub fn dedup_keep_first(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = std::collections::HashSet::new();
        self.rows.retain(|row| seen.insert(row.key));
        before - self.rows.len()
    }

    /// Appends the rows of `other` after the rows of `self`.
    pub fn concat(&mut self, other: Self) {
        for column in other.columns {
            self.add_column(column);
        }
        self.rows.extend(other.rows);
    }

    /// Joins two tables on the period key, keeping every key of either side.
    ///
    /// Each row of `self` takes the cells of the first row of `other` with the
    /// same key; cells already present in `self` win. Keys found only in `other`
    /// are appended in `other`'s order, once per key.
    #[must_use]
    pub fn outer_join(mut self, other: Self) -> Self {
        for column in &other.columns {
            self.add_column(column.clone());
        }

        let mut first_by_key: HashMap<PeriodKey, usize> = HashMap::new();
        for (i, row) in other.rows.iter().enumerate() {
            first_by_key.entry(row.key).or_insert(i);
        }

        let mut used = vec![false; other.rows.len()];
        for row in &mut self.rows {
            if let Some(&i) = first_by_key.get(&row.key) {
                used[i] = true;
                for (name, value) in &other.rows[i].cells {
                    row.cells
                        .entry(name.clone())
                        .or_insert_with(|| value.clone());
                }
            }
        }

        for (i, row) in other.rows.into_iter().enumerate() {
            if !used[i] && first_by_key.get(&row.key) == Some(&i) {
                self.rows.push(row);
            }
        }

        self
    }

    /// Fills every missing cell with `value`.
    pub fn fill_missing(&mut self, value: &Value) {
        for row in &mut self.rows {
            for name in &self.columns {
                row.cells
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }

    /// Converts the table into a DataFrame.
    ///
    /// The first column, `period`, holds the row keys. Columns whose cells are
    /// all numeric become `f64` columns; any other column becomes a string column.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        let periods: Vec<String> = self.rows.iter().map(|row| row.key.to_string()).collect();
        columns.push(Column::new("period".into(), periods));

        for name in &self.columns {
            let cells = self.column(name);
            let numeric = cells.iter().flatten().all(|v| v.is_numeric());
            let column = if numeric {
                let values: Vec<Option<f64>> =
                    cells.iter().map(|c| c.and_then(Value::as_f64)).collect();
                Column::new(name.as_str().into(), values)
            } else {
                let values: Vec<Option<String>> =
                    cells.iter().map(|c| c.map(ToString::to_string)).collect();
                Column::new(name.as_str().into(), values)
            };
            columns.push(column);
        }

        DataFrame::new(columns).map_err(|e| DataError::Other(e.to_string()))
    }
}
