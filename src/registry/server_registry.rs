//! Server registry — backend records, status probing, and the merged catalog.
//!
//! All record mutation goes through one `RwLock`. Network I/O never runs
//! while the lock is held: a probe reads the descriptor, does its requests,
//! then applies the outcome in a single write. If the probe is cancelled in
//! between, nothing is written and the previous state stands.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::{Client as HttpClient, StatusCode};
use tokio::task::JoinSet;

use super::catalog::{parse_catalog, CatalogEntry};
use super::errors::{CatalogError, ProbeFailure, RegistryError};
use super::refresh::RefreshTask;
use super::types::{qualified_name, BackendRecord, ServerStatus, ToolRecord, NAME_SEPARATOR};
use crate::config::BackendDescriptor;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout for the shared client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client-wide ceiling; each request also carries its backend's timeout.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RegistryState {
    servers: HashMap<String, BackendRecord>,
    /// `qualified_name → tool`.
    tools: HashMap<String, ToolRecord>,
    last_refresh: Option<DateTime<Utc>>,
}

/// The part of the registry shared with the background loop.
pub(super) struct Shared {
    state: RwLock<RegistryState>,
    http: Mutex<Option<HttpClient>>,
}

// ─── ServerRegistry ──────────────────────────────────────────────────────────

/// Owns every backend record and the catalog built from them.
///
/// Shared with the router as `Arc<ServerRegistry>`; the router only reads.
pub struct ServerRegistry {
    shared: Arc<Shared>,
    refresh: Mutex<Option<RefreshTask>>,
}

impl ServerRegistry {
    /// Create an empty registry with its own HTTP client.
    pub fn new() -> Result<Self, RegistryError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(|e| RegistryError::HttpClient {
                reason: e.to_string(),
            })?;

        Ok(Self {
            shared: Arc::new(Shared {
                state: RwLock::new(RegistryState::default()),
                http: Mutex::new(Some(http)),
            }),
            refresh: Mutex::new(None),
        })
    }

    // ─── Registration ────────────────────────────────────────────────────

    /// Register a backend and probe it once.
    ///
    /// A failed probe is not a registration failure: the record stays, in
    /// `error`, and is re-probed by the next refresh.
    pub async fn register_server(&self, descriptor: BackendDescriptor) -> Result<(), RegistryError> {
        if descriptor.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if descriptor.name.contains(NAME_SEPARATOR) {
            return Err(RegistryError::InvalidName {
                name: descriptor.name,
            });
        }

        let name = descriptor.name.clone();
        let url = descriptor.url.clone();
        {
            let mut state = self.shared.write_state();
            if state.servers.contains_key(&name) {
                return Err(RegistryError::DuplicateServer { name });
            }
            state
                .servers
                .insert(name.clone(), BackendRecord::new(descriptor));
        }

        let status = self.shared.probe_one(&name).await;

        tracing::info!(
            server = %name,
            url = %url,
            status = %status.map_or("removed", ServerStatus::as_str),
            "server registered"
        );
        Ok(())
    }

    /// Remove a backend and every tool it owns in one mutation.
    ///
    /// Returns `false` if no backend by that name was registered.
    pub fn unregister_server(&self, name: &str) -> bool {
        let removed_tools = {
            let mut state = self.shared.write_state();
            if state.servers.remove(name).is_none() {
                return false;
            }
            let before = state.tools.len();
            state.tools.retain(|_, tool| tool.backend_name != name);
            before - state.tools.len()
        };

        tracing::info!(server = %name, removed_tools, "server unregistered");
        true
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn get_server_info(&self, name: &str) -> Option<BackendRecord> {
        self.shared.read_state().servers.get(name).cloned()
    }

    /// All backends, sorted by name.
    pub fn list_servers(&self) -> Vec<BackendRecord> {
        let mut servers: Vec<BackendRecord> =
            self.shared.read_state().servers.values().cloned().collect();
        servers.sort_by(|a, b| a.name().cmp(b.name()));
        servers
    }

    /// Look up a tool by its qualified name (`server.tool`).
    pub fn get_tool(&self, qualified_name: &str) -> Option<ToolRecord> {
        self.shared.read_state().tools.get(qualified_name).cloned()
    }

    /// All tools, or only those of one backend, sorted by qualified name.
    pub fn list_tools(&self, backend: Option<&str>) -> Vec<ToolRecord> {
        let mut tools: Vec<ToolRecord> = self
            .shared
            .read_state()
            .tools
            .values()
            .filter(|tool| backend.map_or(true, |name| tool.backend_name == name))
            .cloned()
            .collect();
        tools.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        tools
    }

    pub fn server_count(&self) -> usize {
        self.shared.read_state().servers.len()
    }

    pub fn online_count(&self) -> usize {
        self.shared.online_count()
    }

    pub fn tool_count(&self) -> usize {
        self.shared.read_state().tools.len()
    }

    /// When the last full refresh finished.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.shared.read_state().last_refresh
    }

    // ─── Probing ─────────────────────────────────────────────────────────

    /// Probe every backend concurrently; one failure never affects another.
    pub async fn refresh_all(&self) {
        self.shared.refresh_all().await;
    }

    /// Probe one backend, refreshing its catalog if it comes up `online`.
    ///
    /// Returns the resulting status, or `None` for an unknown name.
    pub async fn probe_one(&self, name: &str) -> Option<ServerStatus> {
        self.shared.probe_one(name).await
    }

    // ─── Background Refresh ──────────────────────────────────────────────

    /// Start the periodic refresh loop.
    ///
    /// Returns `false` without doing anything if a loop is already running
    /// or the registry has been shut down.
    pub fn start_background_refresh(&self, interval: Duration) -> bool {
        if self.shared.is_shut_down() {
            tracing::warn!("background refresh not started: registry is shut down");
            return false;
        }

        let mut slot = self.refresh.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(RefreshTask::is_running) {
            tracing::debug!("background refresh already running");
            return false;
        }

        *slot = Some(RefreshTask::spawn(Arc::clone(&self.shared), interval));
        tracing::info!(interval_secs = interval.as_secs_f64(), "background refresh started");
        true
    }

    pub fn is_background_refresh_running(&self) -> bool {
        self.refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(RefreshTask::is_running)
    }

    /// Stop the refresh loop (if any), wait for it, and release the client.
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        let task = self
            .refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.stop().await;
        }

        self.shared
            .http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        tracing::info!("registry shutdown complete");
    }
}

// ─── Shared (probe logic) ────────────────────────────────────────────────────

impl Shared {
    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn client(&self) -> Option<HttpClient> {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_shut_down(&self) -> bool {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn online_count(&self) -> usize {
        self.read_state()
            .servers
            .values()
            .filter(|record| record.is_online())
            .count()
    }

    /// Apply `update` to a backend's record, but only if it is still the
    /// registration the probe started from.
    fn update_record(
        &self,
        descriptor: &BackendDescriptor,
        update: impl FnOnce(&mut BackendRecord),
    ) -> bool {
        let mut state = self.write_state();
        match state.servers.get_mut(&descriptor.name) {
            Some(record) if record.descriptor == *descriptor => {
                update(record);
                true
            }
            _ => false,
        }
    }

    pub(super) async fn refresh_all(self: &Arc<Self>) {
        let names: Vec<String> = self.read_state().servers.keys().cloned().collect();

        let mut probes = JoinSet::new();
        let mut task_names = HashMap::new();
        for name in names {
            let shared = Arc::clone(self);
            let probe_name = name.clone();
            let handle = probes.spawn(async move {
                shared.probe_one(&probe_name).await;
            });
            task_names.insert(handle.id(), name);
        }

        while let Some(joined) = probes.join_next_with_id().await {
            let Err(err) = joined else {
                continue;
            };
            let Some(name) = task_names.get(&err.id()) else {
                continue;
            };
            tracing::error!(server = %name, error = %err, "probe task failed");
            let failure = ProbeFailure::TaskFailed {
                reason: err.to_string(),
            };
            if let Some(record) = self.write_state().servers.get_mut(name) {
                record.status = ServerStatus::Error;
                record.last_error = Some(failure.to_string());
            }
        }

        let (total, online) = {
            let mut state = self.write_state();
            state.last_refresh = Some(Utc::now());
            let online = state.servers.values().filter(|r| r.is_online()).count();
            (state.servers.len(), online)
        };

        tracing::info!(total_servers = total, online_servers = online, "servers refreshed");
    }

    pub(super) async fn probe_one(&self, name: &str) -> Option<ServerStatus> {
        let descriptor = self.read_state().servers.get(name)?.descriptor.clone();

        if !descriptor.enabled {
            self.update_record(&descriptor, |record| {
                record.status = ServerStatus::Offline;
            });
            return Some(ServerStatus::Offline);
        }

        let Some(http) = self.client() else {
            self.record_failure(&descriptor, &ProbeFailure::Shutdown);
            return Some(ServerStatus::Error);
        };

        let started = Instant::now();
        match check_health(&http, &descriptor).await {
            Ok(()) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let applied = self.update_record(&descriptor, |record| {
                    record.status = ServerStatus::Online;
                    record.last_seen = Some(Utc::now());
                    record.last_error = None;
                    record.latency_ms = Some(latency_ms);
                });
                if !applied {
                    return None;
                }
                self.refresh_catalog(&http, &descriptor).await;
                Some(ServerStatus::Online)
            }
            Err(failure) => {
                tracing::warn!(
                    server = %descriptor.name,
                    error = %failure,
                    "server health check failed"
                );
                self.record_failure(&descriptor, &failure);
                Some(ServerStatus::Error)
            }
        }
    }

    fn record_failure(&self, descriptor: &BackendDescriptor, failure: &ProbeFailure) {
        self.update_record(descriptor, |record| {
            record.status = ServerStatus::Error;
            record.last_error = Some(failure.to_string());
        });
    }

    /// Fetch the catalog and swap it in place of the backend's old tools.
    ///
    /// On failure the previous catalog is kept.
    async fn refresh_catalog(&self, http: &HttpClient, descriptor: &BackendDescriptor) {
        let entries = match fetch_catalog(http, descriptor).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!(
                    server = %descriptor.name,
                    error = %err,
                    "server tools refresh failed"
                );
                return;
            }
        };

        let name = descriptor.name.as_str();
        let tools_count = {
            let mut guard = self.write_state();
            let RegistryState { servers, tools, .. } = &mut *guard;

            let record = match servers.get_mut(name) {
                Some(record) if record.descriptor == *descriptor && record.is_online() => record,
                _ => return,
            };

            tools.retain(|_, tool| tool.backend_name != name);
            for entry in entries {
                let tool = ToolRecord::new(name, &entry.name, entry.description, entry.parameters);
                tools.insert(qualified_name(name, &entry.name), tool);
            }

            let count = tools.values().filter(|t| t.backend_name == name).count();
            record.tool_count = count;
            count
        };

        tracing::info!(server = %name, tools_count, "server tools refreshed");
    }
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

async fn check_health(http: &HttpClient, descriptor: &BackendDescriptor) -> Result<(), ProbeFailure> {
    let response = http
        .get(descriptor.health_url())
        .timeout(descriptor.timeout_duration())
        .send()
        .await
        .map_err(|e| ProbeFailure::from_reqwest(&e, descriptor.timeout))?;

    let status = response.status();
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(ProbeFailure::HttpStatus {
            status: status.as_u16(),
        })
    }
}

async fn fetch_catalog(
    http: &HttpClient,
    descriptor: &BackendDescriptor,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let response = http
        .get(descriptor.tools_url())
        .timeout(descriptor.timeout_duration())
        .send()
        .await
        .map_err(|e| CatalogError::Transport {
            reason: e.to_string(),
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(CatalogError::HttpStatus {
            status: status.as_u16(),
        });
    }

    let body: serde_json::Value = response.json().await.map_err(|e| CatalogError::Malformed {
        reason: e.to_string(),
    })?;

    parse_catalog(&body, &descriptor.response_map)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
