//! Scripted transport and recording clock for crawler unit tests

use crate::crawler::fetcher::{Clock, Transport};
use crate::model::RawPage;
use crate::TransportFailure;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub fn page(url: &str, markup: &str) -> RawPage {
    RawPage {
        url: url.to_string(),
        status: 200,
        markup: markup.to_string(),
    }
}

pub fn status_failure(url: &str, status: u16) -> TransportFailure {
    TransportFailure::Status {
        url: url.to_string(),
        status,
    }
}

/// Replays queued responses per URL; an unscripted URL answers 404
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<RawPage, TransportFailure>>>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, response: Result<RawPage, TransportFailure>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self, url: &str) -> u32 {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<RawPage, TransportFailure> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.responses
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(status_failure(url, 404)))
    }
}

/// Records requested sleeps without waiting
#[derive(Default)]
pub struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
