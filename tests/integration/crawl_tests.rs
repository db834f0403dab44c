//! Integration tests for the crawler
//!
//! These tests use wiremock to serve mock career sites and drive them
//! through the real HTTP transport, from single-source crawls up to the
//! full crawl → rank → notify → record pipeline.

use job_scout::config::{
    load_criteria, load_settings_with_hash, load_sources, FetchConfig, PaginationConfig, RuleSet,
};
use job_scout::crawler::{
    crawl_all, crawl_source, run_pipeline, Delivery, HttpTransport, PageFetcher, RetryPolicy,
    TokioClock,
};
use job_scout::events::{EventSink, MemorySink, NoOpSink, ScoutEvent};
use job_scout::output::OutboxNotifier;
use job_scout::state::{CrawlState, StopReason};
use job_scout::storage::{open_history, HistoryStore, RunStatus};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetch settings without any waiting
fn fast_fetch(max_retries: u32) -> FetchConfig {
    FetchConfig {
        max_retries,
        base_delay_ms: 0,
        timeout_secs: 5,
        ..FetchConfig::default()
    }
}

/// Creates a rule set for a mock site paginating through `/jobs?page=N`
fn create_rule_set(base_url: &str, max_pages: Option<u32>) -> RuleSet {
    RuleSet {
        name: "Acme".to_string(),
        base_url: base_url.to_string(),
        career_url: format!("{}/careers", base_url),
        job_listing_selector: "div.opening".to_string(),
        title_selector: "h2".to_string(),
        location_selector: "span.location".to_string(),
        link_selector: "a.apply".to_string(),
        headers: BTreeMap::new(),
        pagination: max_pages.map(|max_pages| PaginationConfig {
            base_url: format!("{}/jobs", base_url),
            param_name: "page".to_string(),
            max_pages,
            has_next_page_selector: Some("a.next".to_string()),
        }),
    }
}

/// Renders a listing page; `jobs` are (title, location, href)
fn listing_page(jobs: &[(&str, &str, &str)], with_next: bool) -> String {
    let mut html = String::from("<html><body><main>");
    for (title, location, href) in jobs {
        html.push_str(&format!(
            r#"<div class="opening"><h2>{}</h2><span class="location">{}</span><a class="apply" href="{}">Apply</a></div>"#,
            title, location, href
        ));
    }
    if with_next {
        html.push_str(r#"<a class="next" href="?page=next">Next</a>"#);
    }
    html.push_str("</main></body></html>");
    html
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn fetcher(
    rules: &RuleSet,
    fetch: &FetchConfig,
    sink: Arc<dyn EventSink>,
) -> PageFetcher<HttpTransport, TokioClock> {
    let transport = HttpTransport::for_source(fetch, rules).expect("Failed to build client");
    PageFetcher::new(transport, TokioClock, RetryPolicy::from_config(fetch), sink)
}

#[tokio::test]
async fn test_paginated_crawl_over_http() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/careers"))
        .respond_with(html_response(listing_page(
            &[
                ("Quantitative Researcher", "New York, NY", "/jobs/1"),
                ("Data Scientist", "Remote", "/jobs/2/"),
            ],
            true,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "2"))
        .respond_with(html_response(listing_page(
            &[("ML Engineer", "Austin, TX", "https://elsewhere.example/ml")],
            false,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rules = create_rule_set(&base_url, Some(5));
    let sink = Arc::new(MemorySink::new());
    let fetcher = fetcher(&rules, &fast_fetch(3), sink.clone());

    let crawl = crawl_source(&rules, &fetcher, sink.as_ref())
        .await
        .expect("Rule set should compile");

    assert_eq!(crawl.state, CrawlState::Done(StopReason::NoNextPage));
    assert_eq!(crawl.pages_fetched, 2);

    let urls: Vec<String> = crawl.records.iter().map(|r| r.url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/jobs/1", base_url),
            format!("{}/jobs/2/", base_url),
            "https://elsewhere.example/ml".to_string(),
        ]
    );
    assert!(crawl.records.iter().all(|r| r.source == "Acme"));

    let pages_extracted = sink
        .events()
        .iter()
        .filter(|e| matches!(e, ScoutEvent::PageExtracted { .. }))
        .count();
    assert_eq!(pages_extracted, 2);
}

#[tokio::test]
async fn test_server_error_keeps_earlier_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/careers"))
        .respond_with(html_response(listing_page(
            &[("Data Scientist", "Remote", "/jobs/1")],
            true,
        )))
        .mount(&mock_server)
        .await;

    // Every attempt at page 2 fails
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let rules = create_rule_set(&base_url, Some(5));
    let sink = Arc::new(MemorySink::new());
    let fetcher = fetcher(&rules, &fast_fetch(3), sink.clone());

    let crawl = crawl_source(&rules, &fetcher, sink.as_ref()).await.unwrap();

    assert_eq!(crawl.state, CrawlState::Failed { page: 2 });
    assert_eq!(crawl.records.len(), 1);
    assert_eq!(crawl.records[0].title, "Data Scientist");

    let retries: Vec<Duration> = sink
        .events()
        .iter()
        .filter_map(|e| match e {
            ScoutEvent::RetryScheduled { delay, .. } => Some(*delay),
            _ => None,
        })
        .collect();
    assert_eq!(retries.len(), 2);
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, ScoutEvent::FetchAbandoned { attempts: 3, .. })));
}

#[tokio::test]
async fn test_source_headers_sent_with_every_request() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/careers"))
        .and(header("x-api-key", "secret"))
        .respond_with(html_response(listing_page(
            &[("Data Scientist", "Remote", "/jobs/1")],
            true,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "2"))
        .and(header("x-api-key", "secret"))
        .respond_with(html_response(listing_page(&[], false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut rules = create_rule_set(&base_url, Some(3));
    rules
        .headers
        .insert("X-Api-Key".to_string(), "secret".to_string());

    let fetcher = fetcher(&rules, &fast_fetch(1), Arc::new(NoOpSink));
    let crawl = crawl_source(&rules, &fetcher, &NoOpSink).await.unwrap();

    assert_eq!(crawl.state, CrawlState::Done(StopReason::EmptyPage));
    assert_eq!(crawl.records.len(), 1);
}

#[tokio::test]
async fn test_crawl_all_isolates_unreachable_source() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/careers"))
        .respond_with(html_response(listing_page(
            &[("Data Scientist", "Remote", "/jobs/1")],
            false,
        )))
        .mount(&mock_server)
        .await;

    let mut missing = create_rule_set(&base_url, None);
    missing.name = "Gone".to_string();
    missing.career_url = format!("{}/no-such-page", base_url);

    let sources = vec![missing, create_rule_set(&base_url, None)];
    let outcome = crawl_all(&sources, &fast_fetch(2), Arc::new(NoOpSink)).await;

    assert_eq!(outcome.sources.len(), 2);
    assert_eq!(outcome.sources[0].state, CrawlState::Failed { page: 1 });
    assert_eq!(outcome.sources[1].state, CrawlState::Done(StopReason::SinglePage));
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].source, "Acme");
}

/// Writes settings, sources and criteria files for a mock site
fn write_config_files(dir: &Path, base_url: &str) -> std::path::PathBuf {
    let sources_path = dir.join("sources.toml");
    let criteria_path = dir.join("criteria.toml");
    let settings_path = dir.join("config.toml");

    std::fs::write(
        &sources_path,
        format!(
            r#"
[[sources]]
name = "Acme"
base_url = "{base}"
career_url = "{base}/careers"
job_listing_selector = "div.opening"
title_selector = "h2"
location_selector = "span.location"
link_selector = "a.apply"

[sources.pagination]
base_url = "{base}/jobs"
param_name = "page"
max_pages = 3
has_next_page_selector = "a.next"

[[sources]]
name = "Broken"
base_url = "{base}"
career_url = "{base}/careers"
job_listing_selector = "div[["
title_selector = "h2"
location_selector = "span"
link_selector = "a"
"#,
            base = base_url
        ),
    )
    .unwrap();

    std::fs::write(
        &criteria_path,
        r#"
primary_keywords = ["Data Scientist", "Quantitative Researcher"]
related_terms = ["python", "machine learning"]
locations = ["remote", "new york"]
exclude_terms = ["senior", "intern"]
match_threshold = 0.7
"#,
    )
    .unwrap();

    std::fs::write(
        &settings_path,
        format!(
            r#"
sources_path = '{sources}'
criteria_path = '{criteria}'

[fetch]
max_retries = 2
base_delay_ms = 0
timeout_secs = 5

[storage]
database_path = '{db}'

[notify]
outbox_dir = '{outbox}'
summary_path = '{summary}'
sender = "alerts@example.com"

[[notify.recipients]]
name = "Ada"
email = "ada@example.com"
"#,
            sources = sources_path.display(),
            criteria = criteria_path.display(),
            db = dir.join("data").join("history.db").display(),
            outbox = dir.join("outbox").display(),
            summary = dir.join("outbox").join("latest.md").display(),
        ),
    )
    .unwrap();

    settings_path
}

fn outbox_messages(dir: &Path) -> Vec<String> {
    let mut messages: Vec<_> = std::fs::read_dir(dir.join("outbox"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "eml"))
        .collect();
    messages.sort();
    messages
        .iter()
        .map(|path| std::fs::read_to_string(path).unwrap())
        .collect()
}

#[tokio::test]
async fn test_full_pipeline_reports_each_job_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/careers"))
        .respond_with(html_response(listing_page(
            &[
                ("Quantitative Researcher", "New York, NY", "/jobs/1"),
                ("Senior Data Scientist", "Remote", "/jobs/2"),
                ("Office Manager", "Remote", "/jobs/3"),
            ],
            true,
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "2"))
        .respond_with(html_response(listing_page(
            &[("Data Scientist", "Remote - US", "/jobs/4")],
            false,
        )))
        .mount(&mock_server)
        .await;

    let settings_path = write_config_files(temp_dir.path(), &base_url);
    let (settings, config_hash) = load_settings_with_hash(&settings_path).unwrap();

    let load_sink = MemorySink::new();
    let sources = load_sources(Path::new(&settings.sources_path), &load_sink).unwrap();
    assert_eq!(sources.len(), 1, "The broken source should be rejected");
    assert!(load_sink.events().iter().any(|e| matches!(
        e,
        ScoutEvent::SourceRejected { source, .. } if source == "Broken"
    )));

    let criteria = load_criteria(Path::new(&settings.criteria_path)).unwrap();
    let notifier = OutboxNotifier::new(&settings.notify);
    let mut history = open_history(Path::new(&settings.storage.database_path)).unwrap();

    // First run reports both matches
    let summary = run_pipeline(
        &settings,
        &config_hash,
        &sources,
        &criteria,
        Some(&mut history),
        &notifier,
        Arc::new(NoOpSink),
    )
    .await
    .unwrap();

    assert_eq!(summary.jobs_found, 4);
    assert_eq!(summary.new_jobs, 4);
    assert_eq!(summary.delivery, Delivery::Sent(1));

    let titles: Vec<&str> = summary
        .matches
        .iter()
        .map(|m| m.record.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Quantitative Researcher", "Data Scientist"]);
    assert!(summary.matches.iter().all(|m| m.score == 1.0));

    let messages = outbox_messages(temp_dir.path());
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Subject: Job Alert: 2 New Matching Positions Found"));
    assert!(messages[0].contains(&format!("{}/jobs/4", base_url)));
    assert!(!messages[0].contains("Office Manager"));

    let digest = std::fs::read_to_string(temp_dir.path().join("outbox").join("latest.md")).unwrap();
    assert!(digest.contains("Quantitative Researcher"));

    // Second run sees the same postings and stays quiet
    let summary = run_pipeline(
        &settings,
        &config_hash,
        &sources,
        &criteria,
        Some(&mut history),
        &notifier,
        Arc::new(NoOpSink),
    )
    .await
    .unwrap();

    assert_eq!(summary.jobs_found, 4);
    assert_eq!(summary.new_jobs, 0);
    assert!(summary.matches.is_empty());
    assert_eq!(summary.delivery, Delivery::Skipped);
    assert_eq!(outbox_messages(temp_dir.path()).len(), 1);

    let latest = history.get_latest_run().unwrap().unwrap();
    assert_eq!(latest.status, RunStatus::Completed);
    assert_eq!(latest.config_hash, config_hash);

    let stats = history.statistics().unwrap();
    assert_eq!(stats.tracked_jobs, 4);
    assert_eq!(stats.runs, 2);
    assert_eq!(stats.notifications_sent, 1);
}
