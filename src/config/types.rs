//! Configuration schema for the hub and its backends.
//!
//! The three mapping tables let a backend keep its own endpoint paths and
//! JSON field names. Each key is optional and resolved against its default
//! at read time, so a partial override never drops the other keys.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─── Defaults ────────────────────────────────────────────────────────────────

pub const DEFAULT_HEALTH_PATH: &str = "/health";
pub const DEFAULT_TOOLS_PATH: &str = "/tools";
pub const DEFAULT_CALL_PATH: &str = "/call";

pub const DEFAULT_TOOLS_KEY: &str = "tools";
pub const DEFAULT_NAME_FIELD: &str = "name";
pub const DEFAULT_DESC_FIELD: &str = "description";

pub const DEFAULT_TOOL_FIELD: &str = "tool";
pub const DEFAULT_ARGS_FIELD: &str = "arguments";

/// Per-backend call budget in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Accepted and reported, never used to drive retries.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Background refresh period in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

fn default_enabled() -> bool {
    true
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}
fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}
fn default_log_level() -> String {
    "info".to_string()
}

// ─── Mapping Tables ──────────────────────────────────────────────────────────

/// Logical endpoint → path on the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,
}

impl EndpointMap {
    pub fn health(&self) -> &str {
        self.health.as_deref().unwrap_or(DEFAULT_HEALTH_PATH)
    }

    pub fn tools(&self) -> &str {
        self.tools.as_deref().unwrap_or(DEFAULT_TOOLS_PATH)
    }

    pub fn call(&self) -> &str {
        self.call.as_deref().unwrap_or(DEFAULT_CALL_PATH)
    }
}

/// Field names used when ingesting a backend's tool catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMap {
    /// Key holding the tool list. `Some("")` means the body is the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_desc_field: Option<String>,
}

impl ResponseMap {
    /// The key to extract the list from, or `None` if the body is the list.
    pub fn tools_key(&self) -> Option<&str> {
        match self.tools_key.as_deref() {
            Some("") => None,
            Some(key) => Some(key),
            None => Some(DEFAULT_TOOLS_KEY),
        }
    }

    pub fn name_field(&self) -> &str {
        self.tool_name_field.as_deref().unwrap_or(DEFAULT_NAME_FIELD)
    }

    pub fn desc_field(&self) -> &str {
        self.tool_desc_field.as_deref().unwrap_or(DEFAULT_DESC_FIELD)
    }
}

/// Field names used when building an outbound tool-call body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_field: Option<String>,
}

impl PayloadMap {
    pub fn tool_field(&self) -> &str {
        self.tool_field.as_deref().unwrap_or(DEFAULT_TOOL_FIELD)
    }

    pub fn args_field(&self) -> &str {
        self.args_field.as_deref().unwrap_or(DEFAULT_ARGS_FIELD)
    }
}

// ─── BackendDescriptor ───────────────────────────────────────────────────────

/// Immutable configuration for one backend server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Unique name, also the namespace prefix of every tool it exposes.
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Disabled backends are never probed and stay `offline`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Timeout in seconds for probes, catalog fetches, and tool calls.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default)]
    pub endpoints: EndpointMap,
    #[serde(default)]
    pub response_map: ResponseMap,
    #[serde(default)]
    pub payload_map: PayloadMap,
}

impl BackendDescriptor {
    /// A descriptor with every optional setting at its default.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: None,
            enabled: true,
            timeout: DEFAULT_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            endpoints: EndpointMap::default(),
            response_map: ResponseMap::default(),
            payload_map: PayloadMap::default(),
        }
    }

    /// The url without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Join the base url with an endpoint path.
    pub fn endpoint_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url())
        } else {
            format!("{}/{path}", self.base_url())
        }
    }

    pub fn health_url(&self) -> String {
        self.endpoint_url(self.endpoints.health())
    }

    pub fn tools_url(&self) -> String {
        self.endpoint_url(self.endpoints.tools())
    }

    pub fn call_url(&self) -> String {
        self.endpoint_url(self.endpoints.call())
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

// ─── Hub Configuration ───────────────────────────────────────────────────────

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// The `hub:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubSettings {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Default tracing filter; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            log_level: default_log_level(),
            log_format: LogFormat::Text,
        }
    }
}

impl HubSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Top-level configuration file (mirrors `config.yaml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub hub: HubSettings,
    #[serde(default)]
    pub servers: Vec<BackendDescriptor>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
