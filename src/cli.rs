use crate::collect::{self, CollectOptions, OutputPaths};
use crate::error::TrafficError;
use crate::fetch::github::{GithubClient, DEFAULT_API_URL};
use crate::fetch::FetchMode;
use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "repotraffic")]
#[command(about = "Collect repository traffic and merge it into append-only history files")]
#[command(version)]
pub struct Cli {
    #[arg(help = "File listing one owner/name repository per line")]
    pub repo_list: PathBuf,

    #[arg(help = "History table for daily view counts")]
    pub view_count: PathBuf,

    #[arg(help = "History table for daily unique viewers")]
    pub view_unique: PathBuf,

    #[arg(help = "History table for daily clone counts")]
    pub clone_count: PathBuf,

    #[arg(help = "History table for daily unique cloners")]
    pub clone_unique: PathBuf,

    #[arg(help = "Snapshot log of top referrers (pass \"\" to skip while keeping paths)")]
    pub referrers: Option<String>,

    #[arg(help = "Snapshot log of popular paths")]
    pub paths: Option<String>,

    #[arg(long, env = "TRAFFIC_ACTION_TOKEN", hide_env_values = true, help = "API access token")]
    pub token: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, help = "Base URL of the REST API")]
    pub api_url: String,

    #[arg(long, default_value = "30s", help = "Per-request timeout (e.g. 10s, 1m)")]
    pub timeout: String,

    #[arg(long, help = "Abort on the first failed fetch instead of skipping the repository")]
    pub strict: bool,

    #[arg(long, help = "Exit with an error when no traffic data was fetched at all")]
    pub fail_on_empty: bool,

    #[arg(short, long, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(short, long, help = "No progress bar or summary")]
    pub quiet: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        init_logging(self.verbose);

        let timeout = parse_timeout(&self.timeout)?;
        let client = GithubClient::new(&self.api_url, &self.token, timeout)
            .context("Failed to build API client")?;

        let repos = collect::load_repo_list(&self.repo_list)
            .with_context(|| format!("Failed to read repository list {}", self.repo_list.display()))?;
        info!(repositories = repos.len(), api = %self.api_url, "starting collection");

        let outputs = OutputPaths {
            view_count: self.view_count,
            view_unique: self.view_unique,
            clone_count: self.clone_count,
            clone_unique: self.clone_unique,
            referrers: optional_path(self.referrers),
            paths: optional_path(self.paths),
        };
        let options = CollectOptions {
            mode: if self.strict { FetchMode::Strict } else { FetchMode::BestEffort },
            fail_on_empty: self.fail_on_empty,
            progress: !self.quiet && !self.verbose,
        };

        let report = collect::run(&client, &repos, &outputs, &options, Local::now().naive_local())
            .context("Traffic collection failed")?;

        if !self.quiet {
            collect::output_summary(&report);
        }
        Ok(())
    }
}

fn optional_path(arg: Option<String>) -> Option<PathBuf> {
    arg.filter(|s| !s.trim().is_empty()).map(PathBuf::from)
}

fn parse_timeout(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| TrafficError::Config(format!("invalid timeout '{input}': {e}")).into())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,repotraffic={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
