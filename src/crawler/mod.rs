//! Crawler module for listing-page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with linear-backoff retries
//! - Rule-driven extraction of job records from listing markup
//! - The per-source pagination state machine
//! - Run coordination across sources and the job-alert pipeline

mod coordinator;
mod extractor;
mod fetcher;
mod pagination;
mod retry;

#[cfg(test)]
mod testutil;

pub use coordinator::{
    crawl_all, crawl_sources, run_pipeline, CrawlOutcome, Delivery, Pipeline, RunSummary,
    SourceReport,
};
pub use extractor::{extract, extract_listings, resolve_job_link, Extraction, ListingRules};
pub use fetcher::{build_http_client, Clock, HttpTransport, PageFetcher, TokioClock, Transport};
pub use pagination::{crawl_source, PaginationDriver, SourceCrawl};
pub use retry::{RetryDecision, RetryPolicy};
