//! State module for tracking pagination progress
//!
//! This module provides the state machine vocabulary used by the
//! pagination driver for a single source.
//!
//! # Components
//!
//! - `CrawlState`: where the driver is (fetching a page, more pages ahead, done, failed)
//! - `StopReason`: why a terminal state was reached

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlState, StopReason};
