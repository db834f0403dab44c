//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with session-wide source headers
//! - GET requests to fetch listing pages
//! - Retry logic for transient failures
//! - A fixed politeness pause after every successful request
//! - Error classification
//!
//! The network and the clock sit behind the [`Transport`] and [`Clock`]
//! traits so the retry loop can be exercised without sockets or sleeping.

use crate::config::{FetchConfig, RuleSet};
use crate::crawler::retry::{RetryDecision, RetryPolicy};
use crate::events::{EventSink, ScoutEvent};
use crate::model::RawPage;
use crate::{ConfigError, ScoutError, TransportFailure};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// A single GET, with no retrying
// Only used through generics, so the futures need no `Send` bound
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: &str) -> Result<RawPage, TransportFailure>;
}

/// Source of delays
#[allow(async_fn_in_trait)]
pub trait Clock {
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Builds an HTTP client for one source
///
/// The source's custom headers become default headers of the client, so
/// they apply to every request made for that source. A `User-Agent` in the
/// source headers overrides the configured one.
///
/// # Example
///
/// ```no_run
/// use job_scout::config::{FetchConfig, RuleSet};
/// use job_scout::crawler::build_http_client;
///
/// # fn example(rules: &RuleSet) {
/// let client = build_http_client(&FetchConfig::default(), rules).unwrap();
/// # }
/// ```
pub fn build_http_client(config: &FetchConfig, rules: &RuleSet) -> Result<Client, ScoutError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &rules.headers {
        let invalid = || ConfigError::InvalidHeader {
            source_name: rules.name.clone(),
            name: name.clone(),
        };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        headers.insert(name, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// [`Transport`] over a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn for_source(config: &FetchConfig, rules: &RuleSet) -> Result<Self, ScoutError> {
        Ok(Self::new(build_http_client(config, rules)?))
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawPage, TransportFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportFailure::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let markup = response.text().await.map_err(|e| TransportFailure::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(RawPage {
            url: url.to_string(),
            status: status.as_u16(),
            markup,
        })
    }
}

fn classify_error(url: &str, error: &reqwest::Error) -> TransportFailure {
    if error.is_timeout() {
        TransportFailure::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        TransportFailure::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        TransportFailure::Request {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Fetches pages with bounded retries and rate limiting
///
/// # Retry Logic
///
/// | Outcome of attempt `n` | Action |
/// |------------------------|--------|
/// | 2xx | Sleep `base_delay`, return markup |
/// | non-2xx, timeout, connection error | Sleep `base_delay * n`, retry |
/// | failure on the last attempt | Return the failure, no sleep |
pub struct PageFetcher<T, C> {
    transport: T,
    clock: C,
    policy: RetryPolicy,
    sink: Arc<dyn EventSink>,
}

impl<T: Transport, C: Clock> PageFetcher<T, C> {
    pub fn new(transport: T, clock: C, policy: RetryPolicy, sink: Arc<dyn EventSink>) -> Self {
        Self {
            transport,
            clock,
            policy,
            sink,
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches `url`, retrying transport failures per the policy
    ///
    /// A terminal failure only concerns this URL; the caller decides what
    /// it means for the rest of the crawl.
    pub async fn fetch(&self, url: &str) -> Result<RawPage, TransportFailure> {
        let mut attempt = 1;

        loop {
            self.sink.emit(&ScoutEvent::RequestStarted {
                url: url.to_string(),
                attempt,
            });

            let failure = match self.transport.get(url).await {
                Ok(page) => {
                    self.sink.emit(&ScoutEvent::FetchSucceeded {
                        url: url.to_string(),
                        status: page.status,
                        bytes: page.markup.len(),
                    });
                    self.clock.sleep(self.policy.success_pause()).await;
                    return Ok(page);
                }
                Err(failure) => failure,
            };

            self.sink.emit(&ScoutEvent::RequestFailed {
                url: url.to_string(),
                attempt,
                error: failure.to_string(),
            });

            match self.policy.on_failure(attempt) {
                RetryDecision::RetryAfter {
                    delay,
                    next_attempt,
                } => {
                    self.sink.emit(&ScoutEvent::RetryScheduled {
                        url: url.to_string(),
                        attempt: next_attempt,
                        delay,
                    });
                    self.clock.sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::GiveUp { attempts } => {
                    self.sink.emit(&ScoutEvent::FetchAbandoned {
                        url: url.to_string(),
                        attempts,
                    });
                    return Err(failure);
                }
            }
        }
    }
}
