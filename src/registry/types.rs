//! Records owned by the server registry.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BackendDescriptor;

/// Connectivity state of one backend.
///
/// No state is terminal; every probe re-evaluates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// Registered, first probe not finished yet.
    Connecting,
    /// Health check answered 200.
    Online,
    /// Disabled in config; never probed.
    Offline,
    /// Last probe failed (non-200 or transport failure).
    Error,
}

impl ServerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live view of one registered backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendRecord {
    pub descriptor: BackendDescriptor,
    pub status: ServerStatus,
    /// Time of the last successful probe.
    pub last_seen: Option<DateTime<Utc>>,
    /// Cause of the most recent failure, cleared on success.
    pub last_error: Option<String>,
    /// Advisory; size of the last ingested catalog.
    pub tool_count: usize,
    /// Advisory; round-trip of the last successful health check.
    pub latency_ms: Option<u64>,
}

impl BackendRecord {
    /// A fresh record in `connecting`.
    pub fn new(descriptor: BackendDescriptor) -> Self {
        Self {
            descriptor,
            status: ServerStatus::Connecting,
            last_seen: None,
            last_error: None,
            tool_count: 0,
            latency_ms: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn is_online(&self) -> bool {
        self.status == ServerStatus::Online
    }
}

/// One tool in the merged catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolRecord {
    /// `{backend}.{tool}` — the only name callers see.
    pub qualified_name: String,
    pub backend_name: String,
    /// Name as the backend knows it.
    pub tool_name: String,
    pub description: String,
    /// Opaque parameter schema, passed through untouched.
    pub parameters: serde_json::Value,
}

impl ToolRecord {
    pub fn new(
        backend_name: &str,
        tool_name: &str,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            qualified_name: qualified_name(backend_name, tool_name),
            backend_name: backend_name.to_string(),
            tool_name: tool_name.to_string(),
            description: description.into(),
            parameters,
        }
    }
}

/// Separator between backend and tool in a qualified name.
pub const NAME_SEPARATOR: char = '.';

/// Build the externally visible name of a tool.
pub fn qualified_name(backend_name: &str, tool_name: &str) -> String {
    format!("{backend_name}{NAME_SEPARATOR}{tool_name}")
}
