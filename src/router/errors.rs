//! Router error types.
//!
//! [`DispatchError`] never crosses the router boundary as an `Err`: it is
//! folded into a [`ToolCallResult`](super::ToolCallResult) through
//! [`DispatchError::code`].

use thiserror::Error;

/// Stable error codes carried in `ToolCallResult::error`.
pub mod codes {
    pub const TOOL_NOT_FOUND: &str = "tool_not_found";
    pub const SERVER_NOT_FOUND: &str = "server_not_found";
    pub const SERVER_OFFLINE: &str = "server_offline";
    pub const TIMEOUT: &str = "timeout";
    pub const EXECUTION_FAILED: &str = "execution_failed";
    /// Prefix for non-200 answers, followed by the status code.
    pub const HTTP_ERROR_PREFIX: &str = "http_error_";
}

/// Failures while resolving or executing a tool call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown tool: '{tool}'")]
    ToolNotFound {
        tool: String,
    },

    #[error("server '{server}' is not registered")]
    ServerNotFound {
        server: String,
    },

    #[error("server '{server}' is {status}")]
    ServerOffline {
        server: String,
        status: String,
    },

    /// The backend answered the call with a non-200 status.
    #[error("backend returned HTTP {status}")]
    RemoteHttp {
        status: u16,
    },

    #[error("tool call timed out after {timeout_secs}s")]
    RemoteTimeout {
        timeout_secs: u64,
    },

    /// Any other transport failure, including an undecodable body.
    #[error("{reason}")]
    RemoteTransport {
        reason: String,
    },

    /// An internal fault during dispatch.
    #[error("execution failed: {reason}")]
    ExecutionFailed {
        reason: String,
    },
}

impl DispatchError {
    /// The machine-readable code reported to callers.
    ///
    /// Transport failures report their description, everything else a
    /// fixed code.
    pub fn code(&self) -> String {
        match self {
            Self::ToolNotFound { .. } => codes::TOOL_NOT_FOUND.to_string(),
            Self::ServerNotFound { .. } => codes::SERVER_NOT_FOUND.to_string(),
            Self::ServerOffline { .. } => codes::SERVER_OFFLINE.to_string(),
            Self::RemoteHttp { status } => format!("{}{status}", codes::HTTP_ERROR_PREFIX),
            Self::RemoteTimeout { .. } => codes::TIMEOUT.to_string(),
            Self::RemoteTransport { reason } => reason.clone(),
            Self::ExecutionFailed { .. } => codes::EXECUTION_FAILED.to_string(),
        }
    }

    /// The backend this failure is attributed to, once resolution got that far.
    pub fn server_name(&self) -> Option<&str> {
        match self {
            Self::ServerNotFound { server } | Self::ServerOffline { server, .. } => Some(server),
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::RemoteTimeout { timeout_secs }
        } else {
            Self::RemoteTransport {
                reason: err.to_string(),
            }
        }
    }
}

/// Errors constructing a router.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("failed to build HTTP client: {reason}")]
    HttpClient {
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            DispatchError::ToolNotFound { tool: "a.b".into() }.code(),
            "tool_not_found"
        );
        assert_eq!(
            DispatchError::ServerNotFound { server: "a".into() }.code(),
            "server_not_found"
        );
        assert_eq!(
            DispatchError::ServerOffline {
                server: "a".into(),
                status: "error".into()
            }
            .code(),
            "server_offline"
        );
        assert_eq!(DispatchError::RemoteHttp { status: 502 }.code(), "http_error_502");
        assert_eq!(DispatchError::RemoteTimeout { timeout_secs: 3 }.code(), "timeout");
        assert_eq!(
            DispatchError::RemoteTransport {
                reason: "connection reset".into()
            }
            .code(),
            "connection reset"
        );
        assert_eq!(
            DispatchError::ExecutionFailed {
                reason: "boom".into()
            }
            .code(),
            "execution_failed"
        );
    }

    #[test]
    fn test_server_name_attribution() {
        assert_eq!(
            DispatchError::ServerOffline {
                server: "weather".into(),
                status: "error".into()
            }
            .server_name(),
            Some("weather")
        );
        assert!(DispatchError::ToolNotFound { tool: "x".into() }
            .server_name()
            .is_none());
    }
}
