use super::TrafficSource;
use crate::error::{Result, TrafficError};
use crate::model::{DailyTraffic, PathEntry, ReferrerEntry};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

#[derive(Deserialize)]
struct ViewsResponse {
    views: Vec<DailyTraffic>,
}

#[derive(Deserialize)]
struct ClonesResponse {
    clones: Vec<DailyTraffic>,
}

/// Blocking client for the repository traffic endpoints of the GitHub REST API.
pub struct GithubClient {
    http: Client,
    api_url: String,
}

impl GithubClient {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| TrafficError::Config("token contains invalid header characters".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn get<T: DeserializeOwned>(&self, repo: &str, endpoint: &str) -> Result<T> {
        let (owner, name) = split_repo(repo)?;
        let url = format!("{}/repos/{owner}/{name}/traffic/{endpoint}", self.api_url);
        debug!(%url, "requesting");

        let response = self.http.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(TrafficError::Fetch(format!(
                "{repo}: traffic/{endpoint} returned {status}"
            )));
        }
        Ok(response.json()?)
    }
}

impl TrafficSource for GithubClient {
    fn views(&self, repo: &str) -> Result<Vec<DailyTraffic>> {
        self.get::<ViewsResponse>(repo, "views").map(|r| r.views)
    }

    fn clones(&self, repo: &str) -> Result<Vec<DailyTraffic>> {
        self.get::<ClonesResponse>(repo, "clones").map(|r| r.clones)
    }

    fn referrers(&self, repo: &str) -> Result<Vec<ReferrerEntry>> {
        self.get(repo, "popular/referrers")
    }

    fn paths(&self, repo: &str) -> Result<Vec<PathEntry>> {
        self.get(repo, "popular/paths")
    }
}

fn split_repo(repo: &str) -> Result<(&str, &str)> {
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(TrafficError::Fetch(format!(
            "'{repo}' is not an owner/name repository identifier"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_repo_requires_owner_and_name() {
        assert_eq!(split_repo("rust-lang/rust").unwrap(), ("rust-lang", "rust"));
        assert!(split_repo("rust").is_err());
        assert!(split_repo("/rust").is_err());
        assert!(split_repo("a/b/c").is_err());
    }

    #[test]
    fn views_payload_truncates_to_days() {
        let body = r#"{"count":3,"uniques":2,"views":[
            {"timestamp":"2024-01-02T00:00:00Z","count":3,"uniques":2}
        ]}"#;
        let parsed: ViewsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.views.len(), 1);
        assert_eq!(parsed.views[0].timestamp.date_naive().to_string(), "2024-01-02");
    }
}
