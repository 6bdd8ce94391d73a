//! Stub backend for integration tests.
//!
//! Serves configurable health, tools, and call endpoints on an ephemeral
//! port and counts every request it receives.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use mcp_hub::BackendDescriptor;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

/// Paths the stub listens on.
#[derive(Clone, Debug)]
pub struct StubPaths {
    pub health: String,
    pub tools: String,
    pub call: String,
}

impl Default for StubPaths {
    fn default() -> Self {
        Self {
            health: "/health".into(),
            tools: "/tools".into(),
            call: "/call".into(),
        }
    }
}

#[derive(Default)]
struct Hits {
    health: AtomicUsize,
    tools: AtomicUsize,
    call: AtomicUsize,
}

#[derive(Clone)]
struct StubState {
    hits: Arc<Hits>,
    health_status: Arc<Mutex<u16>>,
    health_delay: Arc<Mutex<Duration>>,
    catalog: Arc<Mutex<Value>>,
    call_status: Arc<Mutex<u16>>,
    call_result: Arc<Mutex<Value>>,
    call_delay: Arc<Mutex<Duration>>,
    call_bodies: Arc<Mutex<Vec<Value>>>,
}

/// Handle for a running stub backend. Stops the listener on drop.
pub struct StubBackend {
    base_url: String,
    state: StubState,
    join: JoinHandle<()>,
}

impl StubBackend {
    /// Stub on the default paths serving `{"tools": [...]}` with two tools.
    pub async fn spawn() -> Self {
        Self::spawn_with(StubPaths::default(), two_tool_catalog()).await
    }

    pub async fn spawn_with(paths: StubPaths, catalog: Value) -> Self {
        let state = StubState {
            hits: Arc::new(Hits::default()),
            health_status: Arc::new(Mutex::new(200)),
            health_delay: Arc::new(Mutex::new(Duration::ZERO)),
            catalog: Arc::new(Mutex::new(catalog)),
            call_status: Arc::new(Mutex::new(200)),
            call_result: Arc::new(Mutex::new(json!({"message": "Hello from stub!"}))),
            call_delay: Arc::new(Mutex::new(Duration::ZERO)),
            call_bodies: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route(&paths.health, get(health))
            .route(&paths.tools, get(tools))
            .route(&paths.call, post(call))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let join = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            join,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A descriptor pointing at this stub with default mappings.
    pub fn descriptor(&self, name: &str) -> BackendDescriptor {
        let mut descriptor = BackendDescriptor::new(name, self.base_url.clone());
        descriptor.timeout = 5;
        descriptor
    }

    pub fn health_hits(&self) -> usize {
        self.state.hits.health.load(Ordering::SeqCst)
    }

    pub fn tools_hits(&self) -> usize {
        self.state.hits.tools.load(Ordering::SeqCst)
    }

    pub fn call_hits(&self) -> usize {
        self.state.hits.call.load(Ordering::SeqCst)
    }

    pub fn set_health_status(&self, status: u16) {
        *self.state.health_status.lock().unwrap() = status;
    }

    pub fn set_health_delay(&self, delay: Duration) {
        *self.state.health_delay.lock().unwrap() = delay;
    }

    pub fn set_catalog(&self, catalog: Value) {
        *self.state.catalog.lock().unwrap() = catalog;
    }

    pub fn set_call_status(&self, status: u16) {
        *self.state.call_status.lock().unwrap() = status;
    }

    pub fn set_call_result(&self, result: Value) {
        *self.state.call_result.lock().unwrap() = result;
    }

    pub fn set_call_delay(&self, delay: Duration) {
        *self.state.call_delay.lock().unwrap() = delay;
    }

    /// Bodies received on the call endpoint, oldest first.
    pub fn call_bodies(&self) -> Vec<Value> {
        self.state.call_bodies.lock().unwrap().clone()
    }

    /// Stop accepting connections. New requests are refused.
    pub async fn stop(&self) {
        self.join.abort();
        while !self.join.is_finished() {
            tokio::task::yield_now().await;
        }
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// `{"tools": [say_hello, add_numbers]}`.
pub fn two_tool_catalog() -> Value {
    json!({
        "tools": [
            {"name": "say_hello", "description": "Returns a greeting"},
            {
                "name": "add_numbers",
                "description": "Adds two numbers",
                "parameters": {"type": "object", "required": ["a", "b"]}
            }
        ]
    })
}

async fn health(State(state): State<StubState>) -> StatusCode {
    state.hits.health.fetch_add(1, Ordering::SeqCst);
    let delay = *state.health_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let status = *state.health_status.lock().unwrap();
    StatusCode::from_u16(status).unwrap()
}

async fn tools(State(state): State<StubState>) -> Json<Value> {
    state.hits.tools.fetch_add(1, Ordering::SeqCst);
    let catalog = state.catalog.lock().unwrap().clone();
    Json(catalog)
}

async fn call(State(state): State<StubState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.hits.call.fetch_add(1, Ordering::SeqCst);
    state.call_bodies.lock().unwrap().push(body);

    let delay = *state.call_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(*state.call_status.lock().unwrap()).unwrap();
    let result = state.call_result.lock().unwrap().clone();
    (status, Json(json!({ "result": result })))
}
