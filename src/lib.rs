//! MCP Hub — one endpoint in front of many tool-providing servers.
//!
//! - [`registry`] tracks backends, their status, and their tool catalogs
//! - [`router`] resolves `server.tool` names and forwards calls
//! - [`hub`] ties both to one process lifetime
//! - [`config`] loads backend descriptors and hub settings

pub mod config;
pub mod hub;
pub mod registry;
pub mod router;

pub use config::{BackendDescriptor, HubConfig};
pub use hub::{Hub, HubError, HubStatus, ToolListing};
pub use registry::{BackendRecord, ServerRegistry, ServerStatus, ToolRecord};
pub use router::{ToolCallResult, ToolRouter};

use config::{HubSettings, LogFormat};

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` wins over `hub.log_level`. Call once per process.
pub fn init_tracing(settings: &HubSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mcp_hub={},warn", settings.log_level)));

    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    match settings.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
