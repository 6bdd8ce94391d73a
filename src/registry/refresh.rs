//! Background refresh loop.
//!
//! Re-probes every backend on a fixed period. Each cycle runs as its own
//! task so a panic inside it is reported and retried instead of killing
//! the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::server_registry::Shared;

/// Delay before retrying after a cycle fails.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Handle to a running refresh loop.
pub(super) struct RefreshTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Spawn the loop. The first cycle runs immediately.
    pub(super) fn spawn(shared: Arc<Shared>, interval: Duration) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(run_loop(shared, interval, token.clone()));
        Self { token, handle }
    }

    pub(super) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    pub(super) async fn stop(self) {
        self.token.cancel();
        match self.handle.await {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => {}
            Err(err) => tracing::error!(error = %err, "background refresh loop panicked"),
        }
        tracing::info!("background refresh stopped");
    }
}

async fn run_loop(shared: Arc<Shared>, interval: Duration, token: CancellationToken) {
    loop {
        let cycle_shared = Arc::clone(&shared);
        let mut cycle = tokio::spawn(async move { cycle_shared.refresh_all().await });

        let delay = tokio::select! {
            () = token.cancelled() => {
                // Dropping the cycle's probe set aborts any in-flight probes.
                cycle.abort();
                let _ = cycle.await;
                break;
            }
            joined = &mut cycle => match joined {
                Ok(()) => interval,
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        retry_in_secs = RETRY_BACKOFF.as_secs(),
                        "background refresh error"
                    );
                    RETRY_BACKOFF
                }
            },
        };

        tokio::select! {
            () = token.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }
}
