//! Job-Scout: a rule-driven career-site watcher
//!
//! This crate crawls paginated job listings from configurable career sites,
//! scores every posting against keyword, location and exclusion rules, and
//! hands the ranked matches to a notifier.

pub mod config;
pub mod crawler;
pub mod events;
pub mod matching;
pub mod model;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Job-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid {field} selector '{selector}' for source '{source_name}'")]
    InvalidSelector {
        source_name: String,
        field: &'static str,
        selector: String,
    },

    #[error("Invalid header '{name}' for source '{source_name}'")]
    InvalidHeader { source_name: String, name: String },
}

/// A network or HTTP failure while fetching a single page
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

/// Why a listing container could not become a job record
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("missing title")]
    MissingTitle,

    #[error("missing location")]
    MissingLocation,

    #[error("missing link")]
    MissingLink,

    #[error("unresolvable link '{0}'")]
    UnresolvableLink(String),
}

/// Result type alias for Job-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

// Re-export commonly used types
pub use config::{CriteriaSet, RuleSet, Settings};
pub use events::{EventSink, ScoutEvent, TracingSink};
pub use matching::{filter, score};
pub use model::{JobRecord, RawPage, ScoredRecord};
pub use state::{CrawlState, StopReason};
