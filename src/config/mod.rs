//! Hub configuration — backend descriptors and hub settings.
//!
//! Loaded once at startup from `config.yaml`. Nothing here is persisted;
//! the registry rebuilds its state from this on every start.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::ConfigError;
pub use loader::{find_config_path, load_hub_config, parse_hub_config};
pub use types::{
    BackendDescriptor, EndpointMap, HubConfig, HubSettings, LogFormat, PayloadMap, ResponseMap,
};
