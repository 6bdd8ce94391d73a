//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while locating, reading, or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config file could be located.
    #[error("could not find config.yaml (searched from {searched_from})")]
    NotFound {
        searched_from: String,
    },

    /// The config file exists but could not be read.
    #[error("failed to read {path}: {reason}")]
    Read {
        path: String,
        reason: String,
    },

    /// The YAML did not match the schema.
    #[error("failed to parse config: {reason}")]
    Parse {
        reason: String,
    },

    /// The config parsed but violates a constraint.
    #[error("invalid config: {reason}")]
    Invalid {
        reason: String,
    },
}
