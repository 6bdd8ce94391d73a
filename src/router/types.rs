//! Result type returned by every tool call.

use serde::Serialize;

use super::errors::DispatchError;

/// Server name reported when the tool itself could not be resolved.
pub const UNKNOWN_SERVER: &str = "unknown";

/// Normalised outcome of a tool call.
///
/// Produced for every call, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallResult {
    pub success: bool,
    /// The backend's `result` value; `null` when it sent none.
    pub result: Option<serde_json::Value>,
    /// Machine-readable code, present exactly when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub server_name: String,
    /// Wall-clock time in fractional milliseconds.
    pub execution_time_ms: f64,
}

impl ToolCallResult {
    /// A successful call. `server_name` is filled in by the router.
    pub fn succeeded(result: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            result,
            error: None,
            server_name: String::new(),
            execution_time_ms: 0.0,
        }
    }

    /// A failed call carrying `err`'s code.
    pub fn failed(err: &DispatchError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(err.code()),
            server_name: String::new(),
            execution_time_ms: 0.0,
        }
    }

    pub fn with_server(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = server_name.into();
        self
    }
}
