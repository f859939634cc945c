//! Comma-delimited text form of a [`TimeSeriesTable`].
//!
//! ```text
//! date,owner/a,owner/b
//! 2024-01-01,5,NA
//! 2024-01-02,7,2
//! ```
//!
//! Column order is whatever repository order the caller passes to
//! [`serialize`], never the table's internal order. Rows are always written in
//! ascending date order.

use super::{Row, TimeSeriesTable};
use crate::error::{Result, TrafficError};
use crate::model::{CellValue, MISSING};
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

const DATE_HEADER: &str = "date";
const DELIMITER: char = ',';

/// Render `table` with one column per entry of `repos`.
///
/// A repository with no cell on some date is written as `NA`.
pub fn serialize(table: &TimeSeriesTable, repos: &[String]) -> String {
    let mut out = String::new();
    out.push_str(DATE_HEADER);
    for repo in repos {
        out.push(DELIMITER);
        out.push_str(repo);
    }
    out.push('\n');

    for (date, row) in table.rows() {
        let _ = write!(out, "{}", date.format("%Y-%m-%d"));
        for repo in repos {
            out.push(DELIMITER);
            match row.get(repo) {
                Some(value) => {
                    let _ = write!(out, "{value}");
                }
                None => out.push_str(MISSING),
            }
        }
        out.push('\n');
    }
    out
}

/// Parse the text form back into a table and the header's repository order.
///
/// Rows whose field count differs from the header are rejected.
pub fn deserialize(text: &str) -> Result<(TimeSeriesTable, Vec<String>)> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let Some((header_no, header)) = lines.next() else {
        return Ok((TimeSeriesTable::new(), Vec::new()));
    };

    let mut fields = header.split(DELIMITER);
    if fields.next().map(str::trim) != Some(DATE_HEADER) {
        return Err(TrafficError::Parse(format!(
            "line {header_no}: header must start with '{DATE_HEADER}'"
        )));
    }
    let repos: Vec<String> = fields.map(|f| f.trim().to_string()).collect();

    let mut table = TimeSeriesTable::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
        if fields.len() != repos.len() + 1 {
            return Err(TrafficError::Parse(format!(
                "line {line_no}: expected {} fields, found {}",
                repos.len() + 1,
                fields.len()
            )));
        }

        let date = parse_date(fields[0])
            .map_err(|e| TrafficError::Parse(format!("line {line_no}: {e}")))?;

        let mut row = Row::new();
        for (repo, cell) in repos.iter().zip(&fields[1..]) {
            let value: CellValue = cell.parse().map_err(|e| {
                TrafficError::Parse(format!(
                    "line {line_no}: invalid value '{cell}' for {repo}: {e}"
                ))
            })?;
            row.insert(repo.clone(), value);
        }
        *table.ensure_row(date) = row;
    }

    Ok((table, repos))
}

/// Read a table from `path`; `Ok(None)` when the file does not exist.
pub fn load_table(path: &Path) -> Result<Option<(TimeSeriesTable, Vec<String>)>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    deserialize(&text)
        .map(Some)
        .map_err(|e| match e {
            TrafficError::Parse(msg) => {
                TrafficError::Parse(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
}

/// Accepts `YYYY-MM-DD`, or a datetime whose first ten characters are one
/// (`2024-01-01 00:00:00+00:00`, `2024-01-01T00:00:00Z`).
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }

    if input.len() > 10 && input.is_char_boundary(10) {
        let (day, rest) = input.split_at(10);
        if rest.starts_with(['T', ' ']) {
            if let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
                return Ok(date);
            }
        }
    }

    Err(TrafficError::InvalidDate(input.to_string()))
}
