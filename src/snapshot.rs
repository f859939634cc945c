//! Append-only logs of referrer / popular-path snapshots.
//!
//! A log file is a JSON array of `{"timestamp": ..., "data": {repo: [entries]}}`
//! objects. Appending reads the whole array, pushes one snapshot and rewrites
//! the file, so only one writer may touch a log at a time. Snapshots already in
//! the log are carried over as raw JSON and written back unchanged.

use crate::error::Result;
use crate::model::{Snapshot, SnapshotLog};
use crate::util::write_atomic;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

fn read_log_text(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "snapshot log unreadable, starting a new one");
            None
        }
    }
}

fn decode_or_empty<T: DeserializeOwned>(path: &Path, text: &str) -> Vec<T> {
    match serde_json::from_str(text) {
        Ok(log) => log,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "snapshot log malformed, starting a new one");
            Vec::new()
        }
    }
}

/// Load a snapshot log. Missing, unreadable or malformed content yields an
/// empty log.
pub fn load_log<T: DeserializeOwned>(path: &Path) -> SnapshotLog<T> {
    read_log_text(path)
        .map(|text| decode_or_empty(path, &text))
        .unwrap_or_default()
}

/// Load a snapshot log without interpreting its entries. Anything that is a
/// JSON array survives, whatever its entries look like.
pub fn load_raw_log(path: &Path) -> Vec<Value> {
    read_log_text(path)
        .map(|text| decode_or_empty(path, &text))
        .unwrap_or_default()
}

/// Build the snapshot for `entries`, keeping only repositories that have at
/// least one entry, in the order given. `None` when nothing is left.
pub fn build_snapshot<T, I>(entries: I, now: NaiveDateTime) -> Option<Snapshot<T>>
where
    I: IntoIterator<Item = (String, Vec<T>)>,
{
    let mut data: Vec<(String, Vec<T>)> = Vec::new();
    for (repo, list) in entries {
        if list.is_empty() {
            continue;
        }
        // a repeated repository keeps its first position and its last list
        match data.iter_mut().find(|(name, _)| *name == repo) {
            Some(slot) => slot.1 = list,
            None => data.push((repo, list)),
        }
    }

    if data.is_empty() {
        return None;
    }
    Some(Snapshot {
        timestamp: now,
        data,
    })
}

/// Append one snapshot taken at `now` to the log at `path`.
///
/// Returns the number of repositories recorded; zero means there was nothing
/// to record and the file was left alone.
pub fn append<T, I>(path: &Path, entries: I, now: NaiveDateTime) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = (String, Vec<T>)>,
{
    let Some(snapshot) = build_snapshot(entries, now) else {
        debug!(path = %path.display(), "no entries, snapshot log untouched");
        return Ok(0);
    };
    let recorded = snapshot.data.len();

    let mut log = load_raw_log(path);
    log.push(serde_json::to_value(&snapshot)?);

    let mut json = serde_json::to_string_pretty(&log)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())?;

    debug!(path = %path.display(), snapshots = log.len(), "snapshot log rewritten");
    Ok(recorded)
}
