use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrafficError>;

#[derive(Error, Debug)]
pub enum TrafficError {
    #[error("Fetch error: {0}")]
    Fetch(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No traffic data was fetched for any repository")]
    NoData,
}

impl TrafficError {
    /// Errors that best-effort mode may swallow for a single repository.
    pub fn is_fetch(&self) -> bool {
        matches!(self, TrafficError::Fetch(_) | TrafficError::Http(_))
    }
}
