//! ToolRouter — resolves a qualified tool name and forwards the call.
//!
//! Every call produces a [`ToolCallResult`]; nothing escapes as an error
//! or panic. Resolution order, each step a distinct failure:
//! 1. tool known to the registry (`tool_not_found`)
//! 2. owning backend registered (`server_not_found`)
//! 3. backend `online` (`server_offline`)
//! 4. remote call (`http_error_*`, `timeout`, transport text, or
//!    `execution_failed` for internal faults)

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::FutureExt;
use reqwest::Client as HttpClient;
use serde_json::Value;

use super::errors::{DispatchError, RouterError};
use super::remote::call_remote_tool;
use super::types::{ToolCallResult, UNKNOWN_SERVER};
use crate::config::BackendDescriptor;
use crate::registry::{ServerRegistry, ServerStatus};

// ─── Constants ──────────────────────────────────────────────────────────────

/// Client-wide ceiling; each call also carries its backend's timeout.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── ToolRouter ─────────────────────────────────────────────────────────────

/// Dispatches tool calls to the backend that owns them.
pub struct ToolRouter {
    registry: Arc<ServerRegistry>,
    http: Mutex<Option<HttpClient>>,
}

/// A resolved call target.
struct Target {
    descriptor: BackendDescriptor,
    tool_name: String,
}

impl ToolRouter {
    pub fn new(registry: Arc<ServerRegistry>) -> Result<Self, RouterError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(|e| RouterError::HttpClient {
                reason: e.to_string(),
            })?;

        Ok(Self {
            registry,
            http: Mutex::new(Some(http)),
        })
    }

    pub fn registry(&self) -> &Arc<ServerRegistry> {
        &self.registry
    }

    // ─── Dispatch ───────────────────────────────────────────────────────

    /// Execute `tool` (`server.tool`) with `arguments`.
    pub async fn execute_tool(&self, tool: &str, arguments: Value) -> ToolCallResult {
        let start = Instant::now();

        let mut result = match self.resolve(tool) {
            Ok(target) => {
                let server_name = target.descriptor.name.clone();
                self.invoke(&target, &arguments).await.with_server(server_name)
            }
            Err(err) => {
                let server_name = err.server_name().unwrap_or(UNKNOWN_SERVER).to_string();
                ToolCallResult::failed(&err).with_server(server_name)
            }
        };

        result.execution_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        tracing::info!(
            tool_name = %tool,
            server = %result.server_name,
            execution_time_ms = result.execution_time_ms,
            success = result.success,
            error = result.error.as_deref().unwrap_or(""),
            "tool executed"
        );

        result
    }

    fn resolve(&self, tool: &str) -> Result<Target, DispatchError> {
        let record = self
            .registry
            .get_tool(tool)
            .ok_or_else(|| DispatchError::ToolNotFound {
                tool: tool.to_string(),
            })?;

        let server = self
            .registry
            .get_server_info(&record.backend_name)
            .ok_or_else(|| DispatchError::ServerNotFound {
                server: record.backend_name.clone(),
            })?;

        if server.status != ServerStatus::Online {
            return Err(DispatchError::ServerOffline {
                server: record.backend_name,
                status: server.status.to_string(),
            });
        }

        Ok(Target {
            descriptor: server.descriptor,
            tool_name: record.tool_name,
        })
    }

    async fn invoke(&self, target: &Target, arguments: &Value) -> ToolCallResult {
        let Some(http) = self.client() else {
            return ToolCallResult::failed(&DispatchError::ExecutionFailed {
                reason: "router is shut down".into(),
            });
        };

        let call = call_remote_tool(&http, &target.descriptor, &target.tool_name, arguments);
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    server = %target.descriptor.name,
                    tool = %target.tool_name,
                    "tool execution panicked"
                );
                ToolCallResult::failed(&DispatchError::ExecutionFailed {
                    reason: "remote call panicked".into(),
                })
            }
        }
    }

    fn client(&self) -> Option<HttpClient> {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────

    /// Release the HTTP client. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::info!("router shutdown complete");
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
