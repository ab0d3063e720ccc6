//! Scripted [`ApiClient`] used by the unit tests in this crate.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::session::ApiClient;

/// Answers GET/POST calls from per-path response queues and records every
/// call. An exhausted (or never-scripted) queue answers `Null`, which is
/// exactly the appliance's resource-gone shape.
#[derive(Default)]
pub(crate) struct FakeApi {
    get_responses: Mutex<HashMap<String, VecDeque<Value>>>,
    post_responses: Mutex<HashMap<String, VecDeque<Value>>>,
    fail_posts: Mutex<Vec<(String, String)>>,
    calls: Mutex<Vec<(String, String, Value)>>,
    logouts: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_get(&self, path: &str, responses: impl IntoIterator<Item = Value>) {
        self.get_responses
            .lock()
            .entry(path.to_string())
            .or_default()
            .extend(responses);
    }

    pub fn script_post(&self, path: &str, responses: impl IntoIterator<Item = Value>) {
        self.post_responses
            .lock()
            .entry(path.to_string())
            .or_default()
            .extend(responses);
    }

    /// Makes POSTs to `path` fail whenever the serialized body contains
    /// `body_contains`.
    pub fn fail_post(&self, path: &str, body_contains: &str) {
        self.fail_posts
            .lock()
            .push((path.to_string(), body_contains.to_string()));
    }

    pub fn calls_to(&self, verb: &str, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(v, p, _)| v == verb && p == path)
            .count()
    }

    pub fn bodies_for(&self, verb: &str, path: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(v, p, _)| v == verb && p == path)
            .map(|(_, _, body)| body.clone())
            .collect()
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::Relaxed)
    }

    fn record(&self, verb: &str, path: &str, body: Value) {
        self.calls
            .lock()
            .push((verb.to_string(), path.to_string(), body));
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn get(
        &self,
        path: &str,
        _depth: Option<i32>,
        _params: &[(String, String)],
    ) -> Result<Value> {
        self.record("GET", path, Value::Null);
        Ok(self
            .get_responses
            .lock()
            .get_mut(path)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.record("POST", path, body.clone());
        let body_text = body.to_string();
        for (fail_path, needle) in self.fail_posts.lock().iter() {
            if fail_path == path && body_text.contains(needle.as_str()) {
                return Err(Error::Transport {
                    status: 500,
                    body: format!("scripted failure: {needle}"),
                });
            }
        }
        Ok(self
            .post_responses
            .lock()
            .get_mut(path)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Value::Null))
    }

    async fn put(&self, path: &str, body: Value) -> Result<()> {
        self.record("PUT", path, body);
        Ok(())
    }

    async fn patch(&self, path: &str, body: Value) -> Result<()> {
        self.record("PATCH", path, body);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.record("DELETE", path, Value::Null);
        Ok(Value::Null)
    }

    async fn export(&self, path: &str, _file: &Path, params: Value) -> Result<()> {
        self.record("EXPORT", path, params);
        Ok(())
    }

    async fn import(&self, path: &str, _file: &Path, params: Value) -> Result<Value> {
        self.record("IMPORT", path, params);
        Ok(Value::Null)
    }

    async fn logout(&self) -> Result<()> {
        self.logouts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
