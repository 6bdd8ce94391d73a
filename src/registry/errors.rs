//! Registry error types.
//!
//! Only [`RegistryError`] is ever returned to a caller. Probe and catalog
//! failures are absorbed into backend state and logged.

use thiserror::Error;

/// Errors returned by registry construction and registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Backend names are tool namespaces and must not be blank.
    #[error("server name must not be empty")]
    EmptyName,

    /// Backend names may not contain the `.` that separates a qualified
    /// tool name, or `a` + `b.c` and `a.b` + `c` would share `a.b.c`.
    #[error("server name '{name}' must not contain '.'")]
    InvalidName {
        name: String,
    },

    /// A backend with this name is already registered.
    #[error("server '{name}' is already registered")]
    DuplicateServer {
        name: String,
    },

    /// The shared HTTP client could not be built.
    #[error("failed to build HTTP client: {reason}")]
    HttpClient {
        reason: String,
    },
}

/// Why a health probe did not reach `online`.
///
/// The `Display` text is what lands in a backend's `last_error`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// The health endpoint answered with something other than 200.
    #[error("HTTP {status}")]
    HttpStatus {
        status: u16,
    },

    #[error("health check timed out after {timeout_secs}s")]
    Timeout {
        timeout_secs: u64,
    },

    /// Connection refused, DNS failure, reset, and the like.
    #[error("{reason}")]
    Transport {
        reason: String,
    },

    /// The probe task itself died before producing an outcome.
    #[error("probe task failed: {reason}")]
    TaskFailed {
        reason: String,
    },

    /// The registry has released its network client.
    #[error("registry is shut down")]
    Shutdown,
}

impl ProbeFailure {
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::Transport {
                reason: err.to_string(),
            }
        }
    }
}

/// Why a catalog fetch was discarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog endpoint returned HTTP {status}")]
    HttpStatus {
        status: u16,
    },

    #[error("catalog request failed: {reason}")]
    Transport {
        reason: String,
    },

    /// The body was not JSON, or not a list where a list was expected.
    #[error("malformed catalog: {reason}")]
    Malformed {
        reason: String,
    },
}
