/// Crawl state definitions for paginating through one source
///
/// A source crawl starts in `Fetching` at page 1 and ends in either `Done`
/// or `Failed`. Both terminal states keep the records collected so far.
use std::fmt;

/// Represents the current state of a source crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// The given page is about to be fetched
    Fetching { page: u32 },

    /// A page was processed and the driver may continue with `next_page`
    HasMore { next_page: u32 },

    // ===== Terminal States =====
    /// Pagination ended normally
    Done(StopReason),

    /// A page could not be fetched after all retries
    Failed { page: u32 },
}

/// Why pagination ended normally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// No listing container matched on the page
    EmptyPage,

    /// The next-page indicator selector matched nothing
    NoNextPage,

    /// The configured page ceiling was reached
    PageCeiling,

    /// The source does not paginate
    SinglePage,
}

impl CrawlState {
    /// Initial state for every source crawl
    pub fn initial() -> Self {
        Self::Fetching { page: 1 }
    }

    /// Returns true if this is a terminal state (no further pages)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed { .. })
    }

    /// Returns true if this state was reached through a fetch failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short label used in log events
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fetching { .. } => "fetching",
            Self::HasMore { .. } => "has_more",
            Self::Done(_) => "done",
            Self::Failed { .. } => "failed",
        }
    }
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyPage => "empty_page",
            Self::NoNextPage => "no_next_page",
            Self::PageCeiling => "page_ceiling",
            Self::SinglePage => "single_page",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching { page } => write!(f, "fetching(page {})", page),
            Self::HasMore { next_page } => write!(f, "has_more(next {})", next_page),
            Self::Done(reason) => write!(f, "done({})", reason),
            Self::Failed { page } => write!(f, "failed(page {})", page),
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
