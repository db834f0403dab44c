use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Run settings for Job-Scout
///
/// Every key is optional; a missing section falls back to its defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Path to the TOML file holding `[[sources]]`
    #[serde(default = "default_sources_path")]
    pub sources_path: String,

    /// Path to the TOML file holding the search criteria
    #[serde(default = "default_criteria_path")]
    pub criteria_path: String,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

/// HTTP fetch behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Total attempts per page before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay in milliseconds; the pause after a success and the unit of backoff
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent when a source does not override it
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Seen-job history location
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

/// Notification digest settings
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Directory receiving one message file per recipient
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: String,

    /// Path of the markdown digest of the latest run
    #[serde(default = "default_summary_path")]
    pub summary_path: String,

    #[serde(default = "default_sender")]
    pub sender: String,

    /// Subject line; `{new_matches}` is replaced by the match count
    #[serde(default = "default_subject_template")]
    pub subject_template: String,

    /// Notify even when a run produced no matches
    #[serde(default)]
    pub send_empty: bool,

    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

/// A digest recipient
#[derive(Debug, Clone, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

/// Top-level layout of the sources file
///
/// Entries stay untyped here so that each one is converted to a
/// [`RuleSet`] on its own and a malformed entry only rejects itself.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub sources: Vec<toml::Table>,
}

/// Extraction rule set for one career site
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    /// Source (company) name attached to every record
    pub name: String,

    /// Prefix for root-relative job links
    pub base_url: String,

    /// First listing page
    pub career_url: String,

    /// Selector matching one node per job posting
    pub job_listing_selector: String,

    pub title_selector: String,
    pub location_selector: String,

    /// Selector for the element carrying the `href`
    pub link_selector: String,

    /// Extra request headers applied to every request for this source
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub pagination: Option<PaginationConfig>,
}

/// Pagination block of a rule set
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    /// URL that the page parameter is appended to for pages 2 and later
    pub base_url: String,

    pub param_name: String,

    /// Page ceiling
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// When set, pagination continues only while this selector matches
    #[serde(default)]
    pub has_next_page_selector: Option<String>,
}

/// How a rule set moves from one listing page to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    None,
    QueryParameter,
    NextPageIndicator,
}

impl RuleSet {
    pub fn pagination_mode(&self) -> PaginationMode {
        match &self.pagination {
            None => PaginationMode::None,
            Some(p) if p.has_next_page_selector.is_some() => PaginationMode::NextPageIndicator,
            Some(_) => PaginationMode::QueryParameter,
        }
    }

    /// Highest page number the driver may fetch
    pub fn page_ceiling(&self) -> u32 {
        self.pagination.as_ref().map(|p| p.max_pages).unwrap_or(1)
    }

    /// URL of the given 1-based listing page
    pub fn page_url(&self, page: u32) -> String {
        match &self.pagination {
            Some(p) if page > 1 => {
                let separator = if p.base_url.contains('?') { '&' } else { '?' };
                format!("{}{}{}={}", p.base_url, separator, p.param_name, page)
            }
            _ => self.career_url.clone(),
        }
    }
}

/// Search criteria as written in the criteria file
#[derive(Debug, Clone, Deserialize)]
pub struct CriteriaConfig {
    #[serde(default)]
    pub primary_keywords: Vec<String>,

    #[serde(default)]
    pub related_terms: Vec<String>,

    #[serde(default)]
    pub locations: Vec<String>,

    #[serde(default)]
    pub exclude_terms: Vec<String>,

    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
}

/// Prepared criteria: all terms lowercased, deduplicated and ordered
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaSet {
    pub primary_keywords: BTreeSet<String>,
    pub related_terms: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub exclude_terms: BTreeSet<String>,
    pub threshold: f64,
}

impl CriteriaSet {
    pub fn new<'a>(
        primary_keywords: impl IntoIterator<Item = &'a str>,
        related_terms: impl IntoIterator<Item = &'a str>,
        locations: impl IntoIterator<Item = &'a str>,
        exclude_terms: impl IntoIterator<Item = &'a str>,
        threshold: f64,
    ) -> Self {
        Self {
            primary_keywords: prepare_terms(primary_keywords),
            related_terms: prepare_terms(related_terms),
            locations: prepare_terms(locations),
            exclude_terms: prepare_terms(exclude_terms),
            threshold,
        }
    }

    /// A criteria set that matches nothing
    pub fn empty() -> Self {
        Self::new([], [], [], [], default_match_threshold())
    }

    /// True when there is no keyword or related term to match against
    pub fn is_empty(&self) -> bool {
        self.primary_keywords.is_empty() && self.related_terms.is_empty()
    }
}

impl From<CriteriaConfig> for CriteriaSet {
    fn from(config: CriteriaConfig) -> Self {
        Self::new(
            config.primary_keywords.iter().map(String::as_str),
            config.related_terms.iter().map(String::as_str),
            config.locations.iter().map(String::as_str),
            config.exclude_terms.iter().map(String::as_str),
            config.match_threshold,
        )
    }
}

fn prepare_terms<'a>(terms: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    terms
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sources_path: default_sources_path(),
            criteria_path: default_criteria_path(),
            fetch: FetchConfig::default(),
            storage: StorageConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            outbox_dir: default_outbox_dir(),
            summary_path: default_summary_path(),
            sender: default_sender(),
            subject_template: default_subject_template(),
            send_empty: false,
            recipients: Vec::new(),
        }
    }
}

fn default_sources_path() -> String {
    "config/sources.toml".to_string()
}

fn default_criteria_path() -> String {
    "config/criteria.toml".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("job-scout/{}", env!("CARGO_PKG_VERSION"))
}

fn default_database_path() -> String {
    "data/job_history.db".to_string()
}

fn default_outbox_dir() -> String {
    "outbox".to_string()
}

fn default_summary_path() -> String {
    "outbox/latest.md".to_string()
}

fn default_sender() -> String {
    "job-scout@localhost".to_string()
}

fn default_subject_template() -> String {
    "Job Alert: {new_matches} New Matching Positions Found".to_string()
}

fn default_max_pages() -> u32 {
    20
}

pub(crate) fn default_match_threshold() -> f64 {
    0.7
}
