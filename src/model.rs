use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

/// Literal written for "no data available for this repository on this date".
pub const MISSING: &str = "NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    ViewCount,
    ViewUnique,
    CloneCount,
    CloneUnique,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::ViewCount,
        MetricKind::ViewUnique,
        MetricKind::CloneCount,
        MetricKind::CloneUnique,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::ViewCount => "view_count",
            MetricKind::ViewUnique => "view_unique",
            MetricKind::CloneCount => "clone_count",
            MetricKind::CloneUnique => "clone_unique",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell of a [`crate::table::TimeSeriesTable`].
///
/// `Missing` means the repository was not tracked on that date; `Count(0)`
/// means it was tracked and saw no traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellValue {
    Count(u64),
    Missing,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Count(n) => write!(f, "{n}"),
            CellValue::Missing => f.write_str(MISSING),
        }
    }
}

/// Why a table cell is neither `NA` nor a plain run of decimal digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellParseError(String);

impl fmt::Display for CellParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CellParseError {}

impl FromStr for CellValue {
    type Err = CellParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == MISSING {
            return Ok(CellValue::Missing);
        }
        // u64::from_str also takes a leading '+'
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CellParseError("expected NA or a non-negative integer".to_string()));
        }
        s.parse::<u64>().map(CellValue::Count).map_err(|e| match e.kind() {
            IntErrorKind::PosOverflow => CellParseError("count is too large".to_string()),
            _ => CellParseError(e.to_string()),
        })
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    /// Smallest span covering every date yielded, or `None` for no dates.
    pub fn covering<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        dates.into_iter().fold(None, |span: Option<DateSpan>, date| match span {
            Some(span) => Some(span.including(date)),
            None => Some(DateSpan::single(date)),
        })
    }

    pub fn including(self, date: NaiveDate) -> Self {
        Self {
            start: self.start.min(date),
            end: self.end.max(date),
        }
    }

    pub fn union(self, other: DateSpan) -> Self {
        self.including(other.start).including(other.end)
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.num_days()).map(move |offset| start + Duration::days(offset))
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// A per-day data point as returned by the traffic views/clones endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTraffic {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
    pub uniques: u64,
}

/// The four daily series fetched for one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMetrics {
    pub view_count: BTreeMap<NaiveDate, u64>,
    pub view_unique: BTreeMap<NaiveDate, u64>,
    pub clone_count: BTreeMap<NaiveDate, u64>,
    pub clone_unique: BTreeMap<NaiveDate, u64>,
}

impl RepoMetrics {
    pub fn get(&self, kind: MetricKind) -> &BTreeMap<NaiveDate, u64> {
        match kind {
            MetricKind::ViewCount => &self.view_count,
            MetricKind::ViewUnique => &self.view_unique,
            MetricKind::CloneCount => &self.clone_count,
            MetricKind::CloneUnique => &self.clone_unique,
        }
    }

    pub fn record_views(&mut self, views: &[DailyTraffic]) {
        for v in views {
            let date = v.timestamp.date_naive();
            self.view_count.insert(date, v.count);
            self.view_unique.insert(date, v.uniques);
        }
    }

    pub fn record_clones(&mut self, clones: &[DailyTraffic]) {
        for c in clones {
            let date = c.timestamp.date_naive();
            self.clone_count.insert(date, c.count);
            self.clone_unique.insert(date, c.uniques);
        }
    }

    pub fn is_empty(&self) -> bool {
        MetricKind::ALL.iter().all(|k| self.get(*k).is_empty())
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        MetricKind::ALL
            .into_iter()
            .flat_map(move |k| self.get(k).keys().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerEntry {
    pub referrer: String,
    pub count: u64,
    pub uniques: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub path: String,
    pub title: String,
    pub count: u64,
    pub uniques: u64,
}

/// Top referrers and popular paths for one repository, aggregated upstream over
/// a trailing window rather than attributable to a single day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopLists {
    pub referrers: Vec<ReferrerEntry>,
    pub paths: Vec<PathEntry>,
}

/// One timestamped entry of a snapshot log.
///
/// `data` keeps repositories in list order and is written as a JSON object in
/// that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct Snapshot<T> {
    pub timestamp: NaiveDateTime,
    #[serde(with = "ordered_entries")]
    pub data: Vec<(String, Vec<T>)>,
}

impl<T> Snapshot<T> {
    pub fn get(&self, repo: &str) -> Option<&[T]> {
        self.data
            .iter()
            .find(|(name, _)| name == repo)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn repos(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|(name, _)| name.as_str())
    }
}

mod ordered_entries {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, T>(entries: &[(String, Vec<T>)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_map(entries.iter().map(|(name, list)| (name, list)))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, Vec<T>)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = Vec<(String, Vec<T>)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of repository to entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

pub type SnapshotLog<T> = Vec<Snapshot<T>>;
