//! Structured events and the sinks that receive them
//!
//! Every component reports what it does through an injected [`EventSink`]
//! instead of writing to a global logger. The binary wires in a
//! [`TracingSink`]; tests use a [`MemorySink`] to assert on emitted events.

use crate::state::CrawlState;
use std::sync::Mutex;
use std::time::Duration;

/// One observable step of a crawl or scoring run
#[derive(Debug, Clone, PartialEq)]
pub enum ScoutEvent {
    /// A GET is about to be sent
    RequestStarted { url: String, attempt: u32 },

    /// A single attempt failed
    RequestFailed {
        url: String,
        attempt: u32,
        error: String,
    },

    /// The fetcher will sleep before the next attempt
    RetryScheduled {
        url: String,
        attempt: u32,
        delay: Duration,
    },

    /// A page was fetched
    FetchSucceeded { url: String, status: u16, bytes: usize },

    /// Every attempt failed
    FetchAbandoned { url: String, attempts: u32 },

    /// One listing page was parsed
    PageExtracted {
        source: String,
        page: u32,
        containers: usize,
        records: usize,
    },

    /// A listing container was rejected
    RecordDropped { source: String, reason: String },

    /// A source crawl reached a terminal state
    PaginationStopped {
        source: String,
        state: CrawlState,
        pages: u32,
        records: usize,
    },

    /// A configured source was rejected and skipped
    SourceRejected { source: String, error: String },

    /// A configuration file could not be loaded and an empty set was used instead
    ConfigFallback { what: &'static str, error: String },

    /// A record was scored
    RecordScored {
        title: String,
        score: f64,
        explanation: String,
    },

    /// The ranking filter finished a batch
    FilterCompleted {
        evaluated: usize,
        matched: usize,
        threshold: f64,
    },

    /// Already-reported records were removed before scoring
    HistoryFiltered { total: usize, unseen: usize },

    /// The digest was handed to the notifier
    NotificationSent { messages: usize, matches: usize },

    /// The notifier failed; nothing is recorded as seen
    NotificationFailed { error: String },
}

/// Trait for sinks that receive scout events
///
/// Emitting must never fail; sinks swallow their own errors.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ScoutEvent);
}

/// A sink that discards all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: &ScoutEvent) {}
}

/// Forwards events to the `tracing` framework with structured fields
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ScoutEvent) {
        match event {
            ScoutEvent::RequestStarted { url, attempt } => {
                tracing::debug!(url = %url, attempt, "requesting page");
            }
            ScoutEvent::RequestFailed {
                url,
                attempt,
                error,
            } => {
                tracing::warn!(url = %url, attempt, error = %error, "request attempt failed");
            }
            ScoutEvent::RetryScheduled {
                url,
                attempt,
                delay,
            } => {
                tracing::debug!(url = %url, attempt, delay_ms = delay.as_millis() as u64, "retrying");
            }
            ScoutEvent::FetchSucceeded { url, status, bytes } => {
                tracing::debug!(url = %url, status, bytes, "page fetched");
            }
            ScoutEvent::FetchAbandoned { url, attempts } => {
                tracing::error!(url = %url, attempts, "giving up on page");
            }
            ScoutEvent::PageExtracted {
                source,
                page,
                containers,
                records,
            } => {
                tracing::info!(source = %source, page, containers, records, "listing page parsed");
            }
            ScoutEvent::RecordDropped { source, reason } => {
                tracing::warn!(source = %source, reason = %reason, "dropping incomplete listing");
            }
            ScoutEvent::PaginationStopped {
                source,
                state,
                pages,
                records,
            } => {
                if state.is_failure() {
                    tracing::warn!(source = %source, state = %state, pages, records, "source crawl stopped early");
                } else {
                    tracing::info!(source = %source, state = %state, pages, records, "source crawl complete");
                }
            }
            ScoutEvent::SourceRejected { source, error } => {
                tracing::warn!(source = %source, error = %error, "skipping misconfigured source");
            }
            ScoutEvent::ConfigFallback { what, error } => {
                tracing::error!(what, error = %error, "using empty configuration");
            }
            ScoutEvent::RecordScored {
                title,
                score,
                explanation,
            } => {
                tracing::debug!(title = %title, score, explanation = %explanation, "record scored");
            }
            ScoutEvent::FilterCompleted {
                evaluated,
                matched,
                threshold,
            } => {
                tracing::info!(evaluated, matched, threshold, "matching complete");
            }
            ScoutEvent::HistoryFiltered { total, unseen } => {
                tracing::info!(total, unseen, "filtered previously seen jobs");
            }
            ScoutEvent::NotificationSent { messages, matches } => {
                tracing::info!(messages, matches, "notification sent");
            }
            ScoutEvent::NotificationFailed { error } => {
                tracing::error!(error = %error, "notification failed");
            }
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ScoutEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event received so far
    pub fn events(&self) -> Vec<ScoutEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &ScoutEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
