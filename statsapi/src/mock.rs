//! Scripted transport for tests.
//!
//! Responses are queued per URL and consumed in order, except that the
//! last queued response for a URL is sticky: repeated fetches keep
//! returning it. That matches how callers poll a feed that has settled
//! into its final state.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use crate::{FetchError, Transport};

enum Scripted {
    Body(Value),
    Failure(String),
}

#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response body for `url`.
    pub fn respond(&self, url: impl Into<String>, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(Scripted::Body(body));
    }

    /// Queues a transport failure for `url`.
    pub fn fail(&self, url: impl Into<String>, message: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(Scripted::Failure(message.into()));
    }

    /// Total fetches made through this transport.
    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    async fn fetch(
        &self,
        url: &str,
        _params: &[(&'static str, String)],
    ) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(url)
            .ok_or_else(|| FetchError::NoScriptedResponse(url.to_string()))?;

        let scripted = if queue.len() > 1 {
            queue
                .pop_front()
                .ok_or_else(|| FetchError::NoScriptedResponse(url.to_string()))?
        } else {
            match queue.front() {
                Some(Scripted::Body(body)) => Scripted::Body(body.clone()),
                Some(Scripted::Failure(msg)) => Scripted::Failure(msg.clone()),
                None => return Err(FetchError::NoScriptedResponse(url.to_string())),
            }
        };

        match scripted {
            Scripted::Body(body) => Ok(body),
            Scripted::Failure(_) => Err(FetchError::ScriptedFailure(url.to_string())),
        }
    }
}
