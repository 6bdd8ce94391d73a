//! Hub — owns the registry and router for one process lifetime.
//!
//! Startup: register every configured backend, then start the refresh
//! loop. Shutdown: stop the loop, then release both network clients.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, HubConfig};
use crate::registry::{RegistryError, ServerRegistry, ToolRecord};
use crate::router::{RouterError, ToolCallResult, ToolRouter};

/// Errors that stop the hub from starting.
#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Router(#[from] RouterError),
}

/// Snapshot of overall hub health.
#[derive(Debug, Clone, Serialize)]
pub struct HubStatus {
    pub version: &'static str,
    pub uptime_seconds: f64,
    pub servers_count: usize,
    pub servers_online: usize,
    pub tools_count: usize,
    pub last_refresh: Option<DateTime<Utc>>,
}

/// A tool listing with the counters shown alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct ToolListing {
    pub tools: Vec<ToolRecord>,
    pub total_count: usize,
    pub servers_online: usize,
    /// When the last full refresh finished.
    pub last_updated: Option<DateTime<Utc>>,
}

pub struct Hub {
    registry: Arc<ServerRegistry>,
    router: ToolRouter,
    started_at: Instant,
}

impl Hub {
    /// Build the registry and router, register every configured backend,
    /// and start the background refresh.
    ///
    /// A backend that fails to register is logged and skipped.
    pub async fn start(config: &HubConfig) -> Result<Self, HubError> {
        crate::config::loader::validate(config)?;

        let registry = Arc::new(ServerRegistry::new()?);
        let router = ToolRouter::new(Arc::clone(&registry))?;

        for descriptor in &config.servers {
            if let Err(e) = registry.register_server(descriptor.clone()).await {
                tracing::error!(
                    server = %descriptor.name,
                    error = %e,
                    "server registration failed"
                );
            }
        }

        registry.start_background_refresh(config.hub.refresh_interval());

        Ok(Self {
            registry,
            router,
            started_at: Instant::now(),
        })
    }

    pub fn registry(&self) -> &Arc<ServerRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &ToolRouter {
        &self.router
    }

    /// Shorthand for [`ToolRouter::execute_tool`].
    pub async fn execute_tool(&self, tool: &str, arguments: serde_json::Value) -> ToolCallResult {
        self.router.execute_tool(tool, arguments).await
    }

    pub fn status(&self) -> HubStatus {
        HubStatus {
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
            servers_count: self.registry.server_count(),
            servers_online: self.registry.online_count(),
            tools_count: self.registry.tool_count(),
            last_refresh: self.registry.last_refresh(),
        }
    }

    pub fn tool_listing(&self, backend: Option<&str>) -> ToolListing {
        let tools = self.registry.list_tools(backend);
        ToolListing {
            total_count: tools.len(),
            servers_online: self.registry.online_count(),
            last_updated: self.registry.last_refresh(),
            tools,
        }
    }

    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
        self.router.shutdown().await;
        tracing::info!("hub shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendDescriptor;

    #[tokio::test]
    async fn test_start_with_disabled_servers() {
        let mut quiet = BackendDescriptor::new("quiet", "http://127.0.0.1:9");
        quiet.enabled = false;
        let config = HubConfig {
            servers: vec![quiet],
            ..HubConfig::default()
        };

        let hub = Hub::start(&config).await.unwrap();
        let status = hub.status();
        assert_eq!(status.servers_count, 1);
        assert_eq!(status.servers_online, 0);
        assert_eq!(status.tools_count, 0);
        assert!(hub.registry().is_background_refresh_running());

        hub.shutdown().await;
        assert!(!hub.registry().is_background_refresh_running());
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let config = HubConfig {
            servers: vec![
                BackendDescriptor::new("a", "http://127.0.0.1:9"),
                BackendDescriptor::new("a", "http://127.0.0.1:9"),
            ],
            ..HubConfig::default()
        };
        assert!(matches!(
            Hub::start(&config).await,
            Err(HubError::Config(_))
        ));
    }
}
