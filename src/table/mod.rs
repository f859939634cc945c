pub mod codec;
pub mod fill;

pub use codec::{deserialize, load_table, serialize};
pub use fill::fill;

use crate::model::{CellValue, DateSpan};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub type Row = BTreeMap<String, CellValue>;

/// Sparse table of one metric, keyed by date then repository.
///
/// Rows are kept in ascending date order. A row only holds the repositories
/// that have been set for that date; [`fill`] is what makes rows complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeriesTable {
    rows: BTreeMap<NaiveDate, Row>,
}

impl TimeSeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of date rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    pub fn span(&self) -> Option<DateSpan> {
        let first = self.rows.keys().next()?;
        let last = self.rows.keys().next_back()?;
        Some(DateSpan::new(*first, *last))
    }

    pub fn contains_date(&self, date: &NaiveDate) -> bool {
        self.rows.contains_key(date)
    }

    pub fn row(&self, date: &NaiveDate) -> Option<&Row> {
        self.rows.get(date)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&NaiveDate, &Row)> {
        self.rows.iter()
    }

    pub fn get(&self, date: &NaiveDate, repo: &str) -> Option<CellValue> {
        self.rows.get(date).and_then(|row| row.get(repo)).copied()
    }

    pub fn set(&mut self, date: NaiveDate, repo: impl Into<String>, value: CellValue) {
        self.rows.entry(date).or_default().insert(repo.into(), value);
    }

    pub fn set_count(&mut self, date: NaiveDate, repo: impl Into<String>, count: u64) {
        self.set(date, repo, CellValue::Count(count));
    }

    /// Insert an empty row for `date` if there is none yet.
    pub fn ensure_row(&mut self, date: NaiveDate) -> &mut Row {
        self.rows.entry(date).or_default()
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = (&NaiveDate, &mut Row)> {
        self.rows.iter_mut()
    }

    /// Write freshly fetched counts for one repository over whatever is there.
    ///
    /// Dates and repositories not in `values` are left untouched.
    pub fn overlay<'a, I>(&mut self, repo: &str, values: I)
    where
        I: IntoIterator<Item = (&'a NaiveDate, &'a u64)>,
    {
        for (date, count) in values {
            self.set_count(*date, repo, *count);
        }
    }
}
