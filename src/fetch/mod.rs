pub mod github;

pub use github::GithubClient;

use crate::error::Result;
use crate::model::{DailyTraffic, PathEntry, ReferrerEntry, RepoMetrics, TopLists};
use tracing::{debug, warn};

/// Remote source of repository traffic.
///
/// Each call covers whatever trailing window the upstream exposes.
pub trait TrafficSource {
    fn views(&self, repo: &str) -> Result<Vec<DailyTraffic>>;
    fn clones(&self, repo: &str) -> Result<Vec<DailyTraffic>>;
    fn referrers(&self, repo: &str) -> Result<Vec<ReferrerEntry>>;
    fn paths(&self, repo: &str) -> Result<Vec<PathEntry>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Fetch failures are logged and recorded as absent data.
    #[default]
    BestEffort,
    /// The first fetch failure aborts the run.
    Strict,
}

/// Outcome of fetching one repository: what was obtained, and whether some
/// call failed along the way (best-effort mode only).
#[derive(Debug, Clone, Default)]
pub struct Fetched<T> {
    pub data: T,
    pub failed: bool,
}

/// Views then clones. A failure stops the sequence but keeps what was already
/// fetched.
pub fn fetch_metrics(
    source: &dyn TrafficSource,
    repo: &str,
    mode: FetchMode,
) -> Result<Fetched<RepoMetrics>> {
    let mut metrics = RepoMetrics::default();

    let outcome = source.views(repo).and_then(|views| {
        metrics.record_views(&views);
        source.clones(repo)
    });

    match outcome {
        Ok(clones) => {
            metrics.record_clones(&clones);
            debug!(repo, days = metrics.view_count.len(), "fetched traffic metrics");
            Ok(Fetched {
                data: metrics,
                failed: false,
            })
        }
        Err(e) => swallow(e, repo, "traffic metrics", mode).map(|()| Fetched {
            data: metrics,
            failed: true,
        }),
    }
}

/// Referrers then paths, with the same partial-result rule as [`fetch_metrics`].
pub fn fetch_top_lists(
    source: &dyn TrafficSource,
    repo: &str,
    mode: FetchMode,
) -> Result<Fetched<TopLists>> {
    let mut lists = TopLists::default();

    let outcome = source.referrers(repo).and_then(|referrers| {
        lists.referrers = referrers;
        source.paths(repo)
    });

    match outcome {
        Ok(paths) => {
            lists.paths = paths;
            Ok(Fetched {
                data: lists,
                failed: false,
            })
        }
        Err(e) => swallow(e, repo, "referrers and paths", mode).map(|()| Fetched {
            data: lists,
            failed: true,
        }),
    }
}

fn swallow(err: crate::error::TrafficError, repo: &str, what: &str, mode: FetchMode) -> Result<()> {
    if mode == FetchMode::Strict || !err.is_fetch() {
        return Err(err);
    }
    warn!(repo, error = %err, "failed to fetch {what}, continuing without it");
    Ok(())
}
