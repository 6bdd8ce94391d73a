//! `mcp-hub [config.yaml]` — run the hub until Ctrl-C.

use std::path::PathBuf;

use anyhow::Context;
use mcp_hub::config::{find_config_path, load_hub_config};
use mcp_hub::Hub;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => {
            let cwd = std::env::current_dir().context("failed to read working directory")?;
            find_config_path(&cwd)?
        }
    };

    let config =
        load_hub_config(&path).with_context(|| format!("failed to load {}", path.display()))?;

    mcp_hub::init_tracing(&config.hub);

    let hub = Hub::start(&config).await?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %path.display(),
        servers_count = config.servers.len(),
        servers_online = hub.status().servers_online,
        refresh_interval_secs = config.hub.refresh_interval_secs,
        pid = std::process::id(),
        "=== MCP Hub started ==="
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    hub.shutdown().await;
    Ok(())
}
