//! Records flowing through the crawl and scoring pipeline

use chrono::{DateTime, Utc};

/// Markup returned by one successful GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// URL that was requested
    pub url: String,

    /// HTTP status code of the response
    pub status: u16,

    /// Response body
    pub markup: String,
}

/// A single job posting extracted from a listing page
///
/// All three of `title`, `location` and `url` are always present; the
/// extractor never emits a partial record. `url` is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub title: String,
    pub location: String,
    pub url: String,

    /// Name of the source (company) the record was crawled from
    pub source: String,

    pub discovered_at: DateTime<Utc>,
}

/// A job record that passed the ranking filter
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: JobRecord,

    /// Match score in [0, 1], rounded to two decimals
    pub score: f64,
}

impl ScoredRecord {
    pub fn new(record: JobRecord, raw_score: f64) -> Self {
        Self {
            record,
            score: round_score(raw_score),
        }
    }
}

/// Rounds a score to two decimal places, exact halves to even
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round_ties_even() / 100.0
}
