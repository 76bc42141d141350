//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::core::response_log::LogReader;
use crate::network::{TransferError, Transport};

const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// A transport that answers from a fixed table instead of the network.
///
/// Unknown URLs fail with `TransferError::Network`.
#[derive(Default)]
pub struct StubTransport {
    responses: HashMap<String, Option<Vec<u8>>>,
    delays: HashMap<String, Duration>,
    started: Mutex<Vec<String>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), Some(body.as_bytes().to_vec()));
        self
    }

    pub fn fail(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), None);
        self
    }

    pub fn delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// URLs in the order their transfers started.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for StubTransport {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch(&self, url: &str, sink: &mut Vec<u8>) -> Result<(), TransferError> {
        if let Ok(mut started) = self.started.lock() {
            started.push(url.to_string());
        }
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        match self.responses.get(url) {
            Some(Some(body)) => {
                // two chunks, like a body split across reads
                let (head, tail) = body.split_at(body.len() / 2);
                sink.extend_from_slice(head);
                sink.extend_from_slice(tail);
                Ok(())
            }
            _ => Err(TransferError::Network(format!("stub has no answer for {url}"))),
        }
    }
}

/// A transport whose transfers never finish. Counts how many were started.
#[derive(Default)]
pub struct PendingTransport {
    started: AtomicUsize,
}

impl PendingTransport {
    pub fn wait_for_started(&self, count: usize) -> bool {
        wait_until(|| self.started.load(Ordering::SeqCst) >= count)
    }
}

#[async_trait]
impl Transport for PendingTransport {
    fn name(&self) -> &str {
        "pending"
    }

    async fn fetch(&self, _url: &str, _sink: &mut Vec<u8>) -> Result<(), TransferError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Block until `log` holds at least `count` responses (gives up after 5s).
pub fn wait_for_published(log: &LogReader, count: usize) -> bool {
    wait_until(|| log.published() >= count)
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_LIMIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
