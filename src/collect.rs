use crate::error::{Result, TrafficError};
use crate::fetch::{fetch_metrics, fetch_top_lists, FetchMode, TrafficSource};
use crate::model::{DateSpan, MetricKind, PathEntry, ReferrerEntry, RepoMetrics};
use crate::table::{self, TimeSeriesTable};
use crate::util::write_atomic;
use chrono::NaiveDateTime;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where one run reads and writes its history.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub view_count: PathBuf,
    pub view_unique: PathBuf,
    pub clone_count: PathBuf,
    pub clone_unique: PathBuf,
    pub referrers: Option<PathBuf>,
    pub paths: Option<PathBuf>,
}

impl OutputPaths {
    pub fn table(&self, kind: MetricKind) -> &Path {
        match kind {
            MetricKind::ViewCount => &self.view_count,
            MetricKind::ViewUnique => &self.view_unique,
            MetricKind::CloneCount => &self.clone_count,
            MetricKind::CloneUnique => &self.clone_unique,
        }
    }

    pub fn wants_top_lists(&self) -> bool {
        self.referrers.is_some() || self.paths.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    pub mode: FetchMode,
    /// Fail with [`TrafficError::NoData`] instead of skipping table writes
    /// when no repository returned any dated traffic.
    pub fail_on_empty: bool,
    pub progress: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub repositories: usize,
    pub failed: Vec<String>,
    /// Date span of the rewritten tables; `None` when tables were left alone.
    pub span: Option<DateSpan>,
    pub rows: usize,
    pub referrer_repos: usize,
    pub path_repos: usize,
}

impl RunReport {
    pub fn tables_written(&self) -> bool {
        self.span.is_some()
    }
}

/// One repository identifier per line. Blank lines are skipped, duplicates kept.
pub fn load_repo_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Fetch every repository once, merge into the four history tables and append
/// the referrer/path snapshots.
pub fn run(
    source: &dyn TrafficSource,
    repos: &[String],
    outputs: &OutputPaths,
    options: &CollectOptions,
    now: NaiveDateTime,
) -> Result<RunReport> {
    let mut history = Vec::with_capacity(MetricKind::ALL.len());
    for kind in MetricKind::ALL {
        let path = outputs.table(kind);
        let table = match table::load_table(path)? {
            Some((table, _)) => table,
            None => TimeSeriesTable::new(),
        };
        info!(metric = %kind, rows = table.len(), path = %path.display(), "loaded history");
        history.push((kind, table));
    }

    let mut report = RunReport {
        repositories: repos.len(),
        ..RunReport::default()
    };
    let mut fetched: Vec<(String, RepoMetrics)> = Vec::with_capacity(repos.len());
    let mut referrers: Vec<(String, Vec<ReferrerEntry>)> = Vec::new();
    let mut paths: Vec<(String, Vec<PathEntry>)> = Vec::new();

    let pb = progress_bar(repos.len(), options.progress);
    for repo in repos {
        pb.set_message(repo.clone());

        let metrics = fetch_metrics(source, repo, options.mode)?;
        let mut failed = metrics.failed;
        fetched.push((repo.clone(), metrics.data));

        if outputs.wants_top_lists() {
            let lists = fetch_top_lists(source, repo, options.mode)?;
            failed |= lists.failed;
            referrers.push((repo.clone(), lists.data.referrers));
            paths.push((repo.clone(), lists.data.paths));
        }

        if failed {
            report.failed.push(repo.clone());
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    match DateSpan::covering(fetched.iter().flat_map(|(_, m)| m.dates())) {
        Some(span) => {
            let rendered = merge_tables(history, &fetched, span, repos);
            for (kind, table, text) in &rendered {
                write_atomic(outputs.table(*kind), text.as_bytes())?;
                info!(metric = %kind, rows = table.len(), "history written");
            }
            report.span = rendered.first().and_then(|(_, table, _)| table.span());
            report.rows = rendered.first().map(|(_, table, _)| table.len()).unwrap_or(0);
        }
        None if options.fail_on_empty => return Err(TrafficError::NoData),
        None => {
            warn!("no traffic data fetched for any repository, history tables left unchanged");
        }
    }

    if let Some(path) = &outputs.referrers {
        report.referrer_repos = crate::snapshot::append(path, referrers, now)?;
    }
    if let Some(path) = &outputs.paths {
        report.path_repos = crate::snapshot::append(path, paths, now)?;
    }

    Ok(report)
}

/// Gap-fill each table over `span`, lay the fresh counts on top and render it.
///
/// Everything is rendered before anything is written.
fn merge_tables(
    history: Vec<(MetricKind, TimeSeriesTable)>,
    fetched: &[(String, RepoMetrics)],
    span: DateSpan,
    repos: &[String],
) -> Vec<(MetricKind, TimeSeriesTable, String)> {
    history
        .into_iter()
        .map(|(kind, existing)| {
            let mut merged = table::fill(existing, span, repos);
            for (repo, metrics) in fetched {
                merged.overlay(repo, metrics.get(kind));
            }
            let text = table::serialize(&merged, repos);
            (kind, merged, text)
        })
        .collect()
}

fn progress_bar(len: usize, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

pub fn output_summary(report: &RunReport) {
    println!("{}", style("Traffic Summary").bold());
    println!("{}", "─".repeat(50));

    println!("Repositories: {}", style(report.repositories).cyan());
    match report.span {
        Some(span) => {
            println!("Date range: {}", style(span).dim());
            println!("Rows per table: {}", style(report.rows).cyan());
        }
        None => println!("{}", style("No traffic data fetched; tables unchanged").yellow()),
    }
    if report.referrer_repos > 0 {
        println!("Referrer snapshot: {} repositories", style(report.referrer_repos).green());
    }
    if report.path_repos > 0 {
        println!("Path snapshot: {} repositories", style(report.path_repos).green());
    }
    if !report.failed.is_empty() {
        println!(
            "Failed to fetch: {}",
            style(report.failed.join(", ")).red()
        );
    }
}
