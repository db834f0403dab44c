//! Listing extractor
//!
//! This module interprets a source's extraction rules against one listing
//! page. It selects every listing container, pulls the title, location and
//! link out of each one, and resolves the link to an absolute URL.
//! A container missing any of the three fields produces no record.

use crate::config::RuleSet;
use crate::events::{EventSink, ScoutEvent};
use crate::model::JobRecord;
use crate::{ConfigError, ExtractionFailure};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled form of a [`RuleSet`]'s selectors
#[derive(Debug, Clone)]
pub struct ListingRules {
    source: String,
    base_url: String,
    listing: Selector,
    title: Selector,
    location: Selector,
    link: Selector,
    next_page: Option<Selector>,
}

impl ListingRules {
    /// Compiles every selector of the rule set
    pub fn compile(rules: &RuleSet) -> Result<Self, ConfigError> {
        let compile = |field: &'static str, selector: &str| {
            Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
                source_name: rules.name.clone(),
                field,
                selector: selector.to_string(),
            })
        };

        let next_page = match rules
            .pagination
            .as_ref()
            .and_then(|p| p.has_next_page_selector.as_deref())
        {
            Some(selector) => Some(compile("has_next_page", selector)?),
            None => None,
        };

        Ok(Self {
            source: rules.name.clone(),
            base_url: rules.base_url.clone(),
            listing: compile("job_listing", &rules.job_listing_selector)?,
            title: compile("title", &rules.title_selector)?,
            location: compile("location", &rules.location_selector)?,
            link: compile("link", &rules.link_selector)?,
            next_page,
        })
    }
}

/// Everything learned from one listing page
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Number of nodes matching the listing-container selector
    pub containers: usize,

    /// Complete records, in document order
    pub records: Vec<JobRecord>,

    /// Whether the next-page indicator matched; `None` when the source has none
    pub has_next_page: Option<bool>,
}

/// Parses `markup` and extracts its listings
///
/// # Example
///
/// ```no_run
/// use job_scout::config::RuleSet;
/// use job_scout::crawler::{extract, ListingRules};
/// use job_scout::events::NoOpSink;
///
/// # fn example(rule_set: &RuleSet, markup: &str) {
/// let rules = ListingRules::compile(rule_set).unwrap();
/// let page = extract(markup, &rules, chrono::Utc::now(), &NoOpSink);
/// println!("{} records", page.records.len());
/// # }
/// ```
pub fn extract(
    markup: &str,
    rules: &ListingRules,
    discovered_at: DateTime<Utc>,
    sink: &dyn EventSink,
) -> Extraction {
    let document = Html::parse_document(markup);
    extract_listings(&document, rules, discovered_at, sink)
}

/// Extracts listings from an already parsed document
pub fn extract_listings(
    document: &Html,
    rules: &ListingRules,
    discovered_at: DateTime<Utc>,
    sink: &dyn EventSink,
) -> Extraction {
    let mut containers = 0;
    let mut records = Vec::new();

    for element in document.select(&rules.listing) {
        containers += 1;
        match extract_record(element, rules, discovered_at) {
            Ok(record) => records.push(record),
            Err(reason) => sink.emit(&ScoutEvent::RecordDropped {
                source: rules.source.clone(),
                reason: reason.to_string(),
            }),
        }
    }

    let has_next_page = rules
        .next_page
        .as_ref()
        .map(|selector| document.select(selector).next().is_some());

    Extraction {
        containers,
        records,
        has_next_page,
    }
}

/// Builds a record from one listing container
fn extract_record(
    element: ElementRef<'_>,
    rules: &ListingRules,
    discovered_at: DateTime<Utc>,
) -> Result<JobRecord, ExtractionFailure> {
    let title = select_text(element, &rules.title).ok_or(ExtractionFailure::MissingTitle)?;
    let location =
        select_text(element, &rules.location).ok_or(ExtractionFailure::MissingLocation)?;

    let href = element
        .select(&rules.link)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or(ExtractionFailure::MissingLink)?;

    let url = resolve_job_link(href, &rules.base_url)
        .ok_or_else(|| ExtractionFailure::UnresolvableLink(href.to_string()))?;

    Ok(JobRecord {
        title,
        location,
        url,
        source: rules.source.clone(),
        discovered_at,
    })
}

/// Trimmed text of the first match of `selector`, if non-empty
fn select_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Resolves a job link to an absolute URL
///
/// Root-relative links (`/careers/123`) are appended to `base_url`.
/// Absolute http(s) links are kept. Other relative forms are joined
/// against `base_url`. Returns None for non-http schemes
/// (`mailto:`, `javascript:`) and anything that cannot be resolved.
pub fn resolve_job_link(href: &str, base_url: &str) -> Option<String> {
    if href.starts_with('/') && !href.starts_with("//") {
        return Some(format!("{}{}", base_url.trim_end_matches('/'), href));
    }

    let resolved = match Url::parse(href) {
        Ok(absolute) => absolute,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base_url).ok()?.join(href).ok()?,
        Err(_) => return None,
    };

    if resolved.scheme() == "http" || resolved.scheme() == "https" {
        Some(resolved.to_string())
    } else {
        None
    }
}
