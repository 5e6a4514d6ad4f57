//! Mock implementations of the network ports shared by unit tests.

use crate::net::{ApiRequest, ApiResponse, Backend, Connection, Connector, Method};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

// ============================================================================
// Connector
// ============================================================================

/// What the next connect attempt does.
#[derive(Clone, Debug)]
pub enum Script {
    Fail,
    /// Deliver the messages, then drop the connection.
    Drop(Vec<String>),
    /// Deliver the messages, then stay open until closed.
    Hold(Vec<String>),
}

#[derive(Default)]
struct Counters {
    attempts: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    connect_times: Mutex<Vec<Instant>>,
    sent: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct ConnectorStats(Arc<Counters>);

impl ConnectorStats {
    pub fn attempts(&self) -> usize {
        self.0.attempts.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.0.active.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.0.max_active.load(Ordering::SeqCst)
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.0.connect_times.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.0.sent.lock().unwrap().clone()
    }
}

pub struct MockConnector {
    scripts: Mutex<VecDeque<Script>>,
    stats: ConnectorStats,
}

impl MockConnector {
    /// Once the scripts run out, every further attempt holds an empty connection.
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            stats: ConnectorStats::default(),
        }
    }

    pub fn stats(&self) -> ConnectorStats {
        self.stats.clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let counters = &self.stats.0;
        counters.attempts.fetch_add(1, Ordering::SeqCst);
        counters.connect_times.lock().unwrap().push(Instant::now());

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Hold(Vec::new()));

        let (messages, hold) = match script {
            Script::Fail => return Err(anyhow::anyhow!("Mock connect failure")),
            Script::Drop(messages) => (messages, false),
            Script::Hold(messages) => (messages, true),
        };

        let active = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_active.fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(MockConnection {
            messages: messages.into(),
            hold,
            stats: self.stats.clone(),
        }))
    }
}

struct MockConnection {
    messages: VecDeque<String>,
    hold: bool,
    stats: ConnectorStats,
}

#[async_trait]
impl Connection for MockConnection {
    async fn recv(&mut self) -> Option<String> {
        if let Some(message) = self.messages.pop_front() {
            return Some(message);
        }
        if self.hold {
            std::future::pending::<()>().await;
        }
        None
    }

    async fn send(&mut self, text: String) -> Result<()> {
        self.stats.0.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn close(&mut self) {}
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.stats.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Backend
// ============================================================================

#[derive(Default)]
struct Route {
    queued: VecDeque<ApiResponse>,
    last: Option<ApiResponse>,
}

#[derive(Default)]
pub struct MockBackend {
    routes: Mutex<HashMap<(Method, String), Route>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a route. Queued responses are served in order;
    /// once none are left, the last one served keeps being returned.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .queued
            .push_back(ApiResponse {
                status,
                body: body.to_string(),
            });
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        let key = (request.method, request.path.clone());
        self.calls.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        let Some(route) = routes.get_mut(&key) else {
            return Ok(ApiResponse {
                status: 404,
                body: "not found".to_string(),
            });
        };

        if let Some(next) = route.queued.pop_front() {
            route.last = Some(next);
        }

        route.last.clone().ok_or_else(|| anyhow::anyhow!("Mock backend unreachable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_response_replaces_served_one() {
        let backend = MockBackend::new();
        backend.respond(Method::Get, "recordings", 200, "[1]");

        let first = backend.call(ApiRequest::get("recordings")).await.unwrap();
        let again = backend.call(ApiRequest::get("recordings")).await.unwrap();
        assert_eq!(first.body, "[1]");
        assert_eq!(again.body, "[1]");

        backend.respond(Method::Get, "recordings", 200, "[2]");
        let next = backend.call(ApiRequest::get("recordings")).await.unwrap();
        assert_eq!(next.body, "[2]");

        let missing = backend.call(ApiRequest::get("config")).await.unwrap();
        assert_eq!(missing.status, 404);
    }
}
