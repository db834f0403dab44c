//! Pagination driver for a single source
//!
//! Drives the fetch → extract loop page by page and decides when to stop:
//! an empty page, a missing next-page indicator, the page ceiling, or a
//! fetch that failed after all retries. Every stop keeps the records
//! gathered so far.

use crate::config::{PaginationMode, RuleSet};
use crate::crawler::extractor::{extract, ListingRules};
use crate::crawler::fetcher::{Clock, PageFetcher, Transport};
use crate::events::{EventSink, ScoutEvent};
use crate::model::{JobRecord, RawPage};
use crate::state::{CrawlState, StopReason};
use crate::{ConfigError, TransportFailure};
use chrono::{DateTime, Utc};

/// Result of crawling one source to a terminal state
#[derive(Debug, Clone)]
pub struct SourceCrawl {
    pub source: String,
    pub records: Vec<JobRecord>,

    /// `Done(..)` or `Failed { .. }`
    pub state: CrawlState,

    pub pages_fetched: u32,
}

/// State machine paginating through one source
pub struct PaginationDriver<'a> {
    rules: &'a RuleSet,
    listing: ListingRules,
    state: CrawlState,
    records: Vec<JobRecord>,
    pages_fetched: u32,
}

impl<'a> PaginationDriver<'a> {
    pub fn new(rules: &'a RuleSet) -> Result<Self, ConfigError> {
        Ok(Self {
            rules,
            listing: ListingRules::compile(rules)?,
            state: CrawlState::initial(),
            records: Vec::new(),
            pages_fetched: 0,
        })
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    /// URL of the page the driver wants next, if it is fetching
    pub fn current_url(&self) -> Option<String> {
        match self.state {
            CrawlState::Fetching { page } => Some(self.rules.page_url(page)),
            _ => None,
        }
    }

    /// Applies the outcome of fetching the current page
    ///
    /// Only meaningful in `Fetching`; any other state is returned unchanged.
    pub fn advance(
        &mut self,
        fetched: Result<&RawPage, &TransportFailure>,
        discovered_at: DateTime<Utc>,
        sink: &dyn EventSink,
    ) -> CrawlState {
        let page = match self.state {
            CrawlState::Fetching { page } => page,
            other => return other,
        };

        let raw = match fetched {
            Ok(raw) => raw,
            Err(_) => {
                self.state = CrawlState::Failed { page };
                return self.state;
            }
        };

        self.pages_fetched += 1;
        let extraction = extract(&raw.markup, &self.listing, discovered_at, sink);
        sink.emit(&ScoutEvent::PageExtracted {
            source: self.rules.name.clone(),
            page,
            containers: extraction.containers,
            records: extraction.records.len(),
        });

        // A page of incomplete postings still counts as a listing page
        if extraction.containers == 0 {
            self.state = CrawlState::Done(StopReason::EmptyPage);
            return self.state;
        }
        self.records.extend(extraction.records);

        if extraction.has_next_page == Some(false) {
            self.state = CrawlState::Done(StopReason::NoNextPage);
            return self.state;
        }

        let next_page = page + 1;
        self.state = if next_page > self.rules.page_ceiling() {
            match self.rules.pagination_mode() {
                PaginationMode::None => CrawlState::Done(StopReason::SinglePage),
                _ => CrawlState::Done(StopReason::PageCeiling),
            }
        } else {
            CrawlState::HasMore { next_page }
        };
        self.state
    }

    /// Runs the driver to a terminal state
    pub async fn run<T: Transport, C: Clock>(
        mut self,
        fetcher: &PageFetcher<T, C>,
        sink: &dyn EventSink,
    ) -> SourceCrawl {
        loop {
            match self.state {
                CrawlState::Fetching { page } => {
                    let url = self.rules.page_url(page);
                    let fetched = fetcher.fetch(&url).await;
                    self.advance(fetched.as_ref(), Utc::now(), sink);
                }
                CrawlState::HasMore { next_page } => {
                    self.state = CrawlState::Fetching { page: next_page };
                }
                CrawlState::Done(_) | CrawlState::Failed { .. } => break,
            }
        }

        sink.emit(&ScoutEvent::PaginationStopped {
            source: self.rules.name.clone(),
            state: self.state,
            pages: self.pages_fetched,
            records: self.records.len(),
        });

        SourceCrawl {
            source: self.rules.name.clone(),
            records: self.records,
            state: self.state,
            pages_fetched: self.pages_fetched,
        }
    }
}

/// Crawls every page of one source
pub async fn crawl_source<T: Transport, C: Clock>(
    rules: &RuleSet,
    fetcher: &PageFetcher<T, C>,
    sink: &dyn EventSink,
) -> Result<SourceCrawl, ConfigError> {
    let driver = PaginationDriver::new(rules)?;
    Ok(driver.run(fetcher, sink).await)
}
