//! Run coordinator - crawl orchestration and the job-alert pipeline
//!
//! This module sequences a complete run:
//! - Crawling every configured source, one at a time
//! - Isolating per-source failures so one broken site never stops the rest
//! - Dropping jobs reported by earlier runs
//! - Ranking the remaining jobs and handing matches to the notifier
//! - Recording what was reported once delivery succeeded

use crate::config::{CriteriaSet, FetchConfig, RuleSet, Settings};
use crate::crawler::fetcher::{Clock, HttpTransport, PageFetcher, TokioClock, Transport};
use crate::crawler::pagination::crawl_source;
use crate::crawler::retry::RetryPolicy;
use crate::events::{EventSink, ScoutEvent};
use crate::matching::filter;
use crate::model::{JobRecord, ScoredRecord};
use crate::output::{Digest, Notifier};
use crate::state::CrawlState;
use crate::storage::{HistoryStore, RunTotals};
use crate::{Result, ScoutError};
use std::sync::Arc;

/// How one source's crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    pub state: CrawlState,
    pub pages: u32,
    pub records: usize,
}

/// Records from every source, in source order then page order
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub records: Vec<JobRecord>,
    pub sources: Vec<SourceReport>,

    /// Sources skipped because they could not be set up
    pub rejected: Vec<String>,
}

/// What happened to the digest of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing matched and empty digests are disabled
    Skipped,

    /// Delivered as this many messages
    Sent(usize),

    Failed,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// History run ID, when history is enabled
    pub run_id: Option<i64>,

    pub sources: Vec<SourceReport>,
    pub jobs_found: usize,
    pub new_jobs: usize,
    pub matches: Vec<ScoredRecord>,
    pub delivery: Delivery,
}

/// Crawls every source over HTTP
///
/// Each source gets its own client so its custom headers apply to all of
/// its requests and nothing else.
pub async fn crawl_all(
    sources: &[RuleSet],
    fetch: &FetchConfig,
    sink: Arc<dyn EventSink>,
) -> CrawlOutcome {
    let policy = RetryPolicy::from_config(fetch);
    crawl_sources(sources, sink.clone(), |rules| {
        let transport = HttpTransport::for_source(fetch, rules)?;
        Ok(PageFetcher::new(transport, TokioClock, policy, sink.clone()))
    })
    .await
}

/// Crawls every source sequentially with fetchers from `build_fetcher`
///
/// A source whose fetcher cannot be built, or whose rules do not compile,
/// is reported with a `SourceRejected` event and skipped.
pub async fn crawl_sources<T, C, F>(
    sources: &[RuleSet],
    sink: Arc<dyn EventSink>,
    mut build_fetcher: F,
) -> CrawlOutcome
where
    T: Transport,
    C: Clock,
    F: FnMut(&RuleSet) -> Result<PageFetcher<T, C>>,
{
    let mut outcome = CrawlOutcome::default();

    for rules in sources {
        let crawled = match build_fetcher(rules) {
            Ok(fetcher) => crawl_source(rules, &fetcher, sink.as_ref())
                .await
                .map_err(ScoutError::from),
            Err(e) => Err(e),
        };

        match crawled {
            Ok(crawl) => {
                outcome.sources.push(SourceReport {
                    source: crawl.source,
                    state: crawl.state,
                    pages: crawl.pages_fetched,
                    records: crawl.records.len(),
                });
                outcome.records.extend(crawl.records);
            }
            Err(e) => {
                sink.emit(&ScoutEvent::SourceRejected {
                    source: rules.name.clone(),
                    error: e.to_string(),
                });
                outcome.rejected.push(rules.name.clone());
            }
        }
    }

    outcome
}

/// The post-crawl half of a run: dedupe, rank, notify, record
pub struct Pipeline<'a> {
    criteria: &'a CriteriaSet,
    notifier: &'a dyn Notifier,
    history: Option<&'a mut dyn HistoryStore>,
    send_empty: bool,
    sink: Arc<dyn EventSink>,
}

impl<'a> Pipeline<'a> {
    pub fn new(criteria: &'a CriteriaSet, notifier: &'a dyn Notifier, sink: Arc<dyn EventSink>) -> Self {
        Self {
            criteria,
            notifier,
            history: None,
            send_empty: false,
            sink,
        }
    }

    /// Enables deduplication against, and recording into, `history`
    pub fn with_history(mut self, history: &'a mut dyn HistoryStore) -> Self {
        self.history = Some(history);
        self
    }

    /// Deliver a digest even when nothing matched
    pub fn send_empty(mut self, send_empty: bool) -> Self {
        self.send_empty = send_empty;
        self
    }

    /// Crawls all sources over HTTP and processes the result
    pub async fn run(
        &mut self,
        sources: &[RuleSet],
        fetch: &FetchConfig,
        config_hash: &str,
    ) -> Result<RunSummary> {
        let run_id = self.start_run(config_hash)?;
        let crawl = crawl_all(sources, fetch, self.sink.clone()).await;
        self.finish(run_id, crawl)
    }

    /// Opens a history run, if history is enabled
    pub fn start_run(&mut self, config_hash: &str) -> Result<Option<i64>> {
        match self.history.as_deref_mut() {
            Some(store) => Ok(Some(store.create_run(config_hash)?)),
            None => Ok(None),
        }
    }

    /// Processes crawled records and closes the history run
    ///
    /// Jobs are recorded as seen only after the notifier succeeded, so a
    /// failed delivery is retried with the same jobs on the next run.
    pub fn finish(&mut self, run_id: Option<i64>, crawl: CrawlOutcome) -> Result<RunSummary> {
        let CrawlOutcome {
            records, sources, ..
        } = crawl;
        let jobs_found = records.len();

        let new_records = match self.history.as_deref() {
            Some(store) => store.filter_unseen(records)?,
            None => records,
        };
        self.sink.emit(&ScoutEvent::HistoryFiltered {
            total: jobs_found,
            unseen: new_records.len(),
        });

        let matches = filter(&new_records, self.criteria, self.sink.as_ref());
        let delivery = self.deliver(&matches);

        let totals = RunTotals {
            jobs_found,
            new_jobs: new_records.len(),
            matches: matches.len(),
            notified: delivery.is_sent(),
        };

        if let (Some(store), Some(run_id)) = (self.history.as_deref_mut(), run_id) {
            if delivery.is_sent() {
                store.mark_seen(&new_records, run_id)?;
            }
            if delivery == Delivery::Failed {
                store.fail_run(run_id, &totals)?;
            } else {
                store.complete_run(run_id, &totals)?;
            }
        }

        Ok(RunSummary {
            run_id,
            sources,
            jobs_found,
            new_jobs: totals.new_jobs,
            matches,
            delivery,
        })
    }

    fn deliver(&self, matches: &[ScoredRecord]) -> Delivery {
        if matches.is_empty() && !self.send_empty {
            return Delivery::Skipped;
        }

        let digest = Digest::new(matches.to_vec());
        match self.notifier.notify(&digest) {
            Ok(messages) => {
                self.sink.emit(&ScoutEvent::NotificationSent {
                    messages,
                    matches: matches.len(),
                });
                Delivery::Sent(messages)
            }
            Err(e) => {
                self.sink.emit(&ScoutEvent::NotificationFailed {
                    error: e.to_string(),
                });
                Delivery::Failed
            }
        }
    }
}

/// Runs a complete crawl → dedupe → rank → notify → record cycle
///
/// # Example
///
/// ```no_run
/// use job_scout::config::{load_criteria, load_settings_with_hash, load_sources};
/// use job_scout::crawler::run_pipeline;
/// use job_scout::events::TracingSink;
/// use job_scout::output::OutboxNotifier;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (settings, hash) = load_settings_with_hash(Path::new("config.toml"))?;
/// let sources = load_sources(Path::new(&settings.sources_path), &TracingSink)?;
/// let criteria = load_criteria(Path::new(&settings.criteria_path))?;
/// let notifier = OutboxNotifier::new(&settings.notify);
///
/// let summary = run_pipeline(&settings, &hash, &sources, &criteria, None, &notifier, Arc::new(TracingSink)).await?;
/// println!("{} matches", summary.matches.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline(
    settings: &Settings,
    config_hash: &str,
    sources: &[RuleSet],
    criteria: &CriteriaSet,
    history: Option<&mut dyn HistoryStore>,
    notifier: &dyn Notifier,
    sink: Arc<dyn EventSink>,
) -> Result<RunSummary> {
    let mut pipeline = Pipeline::new(criteria, notifier, sink).send_empty(settings.notify.send_empty);
    if let Some(store) = history {
        pipeline = pipeline.with_history(store);
    }
    pipeline.run(sources, &settings.fetch, config_hash).await
}
