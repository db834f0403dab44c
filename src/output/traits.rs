//! Notification traits and types
//!
//! This module defines the trait interface for notifiers and the digest
//! they deliver.

use crate::model::ScoredRecord;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// The ranked matches of one run, ready to be delivered
#[derive(Debug, Clone)]
pub struct Digest {
    /// Matches in score-descending order
    pub matches: Vec<ScoredRecord>,

    pub generated_at: DateTime<Utc>,
}

impl Digest {
    pub fn new(matches: Vec<ScoredRecord>) -> Self {
        Self {
            matches,
            generated_at: Utc::now(),
        }
    }

    /// Fills `{new_matches}` in a subject template
    pub fn subject(&self, template: &str) -> String {
        template.replace("{new_matches}", &self.matches.len().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Trait for notification backends
///
/// A notifier either delivers the digest to every recipient or reports an
/// error; the run pipeline only records jobs as seen after a delivery.
pub trait Notifier {
    /// Delivers the digest
    ///
    /// # Returns
    ///
    /// The number of messages delivered
    fn notify(&self, digest: &Digest) -> OutputResult<usize>;
}
