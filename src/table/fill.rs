use super::{Row, TimeSeriesTable};
use crate::model::{CellValue, DateSpan};
use std::collections::HashSet;

/// Complete `existing` so it has one row for every day of the covered span
/// and a cell for every repository in `repos` on each row.
///
/// The covered span is `span` widened to include every date already in the
/// table; history is never dropped. Repositories missing from an existing row
/// get [`CellValue::Missing`], while days with no row at all get a fresh row
/// of zeros. Columns for repositories outside `repos` are dropped.
pub fn fill(mut existing: TimeSeriesTable, span: DateSpan, repos: &[String]) -> TimeSeriesTable {
    let span = covered_span(&existing, span);
    let wanted: HashSet<&str> = repos.iter().map(String::as_str).collect();

    for (_, row) in existing.rows_mut() {
        row.retain(|repo, _| wanted.contains(repo.as_str()));
        for repo in repos {
            row.entry(repo.clone()).or_insert(CellValue::Missing);
        }
    }

    for day in span.days() {
        if !existing.contains_date(&day) {
            *existing.ensure_row(day) = zero_row(repos);
        }
    }

    existing
}

/// The span [`fill`] will produce for `existing` and `span`.
pub fn covered_span(existing: &TimeSeriesTable, span: DateSpan) -> DateSpan {
    match existing.span() {
        Some(history) => span.union(history),
        None => span,
    }
}

fn zero_row(repos: &[String]) -> Row {
    repos
        .iter()
        .map(|repo| (repo.clone(), CellValue::Count(0)))
        .collect()
}
