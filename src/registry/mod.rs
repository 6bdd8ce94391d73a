//! Server registry — tracks backends, their connectivity, and their tools.
//!
//! This module handles:
//! - Backend registration and removal
//! - Health probing and the per-backend status state machine
//! - Catalog ingestion using each backend's field-name mapping
//! - The background refresh loop
//!
//! The registry is the only writer of backend and tool records. The
//! router reads through the query methods on [`ServerRegistry`].

pub mod catalog;
pub mod errors;
mod refresh;
pub mod server_registry;
pub mod types;

pub use catalog::{parse_catalog, CatalogEntry};
pub use errors::{CatalogError, ProbeFailure, RegistryError};
pub use refresh::RETRY_BACKOFF;
pub use server_registry::ServerRegistry;
pub use types::{qualified_name, BackendRecord, ServerStatus, ToolRecord, NAME_SEPARATOR};
