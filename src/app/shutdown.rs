use std::time::Duration;
use tokio::signal;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal as unix_signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Bound on waiting for the collector after the delivery loop ends. Fits
/// inside Docker's default stop grace period.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(4);

/// Cancels `cancel` on the first SIGINT or SIGTERM.
pub fn spawn_signal_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            () = wait_for_signal() => {
                info!("Initiating graceful shutdown");
                cancel.cancel();
            }
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    let mut sigterm = match unix_signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            warn!("Failed to install SIGTERM handler: {}", err);
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        () = wait_for_ctrl_c() => {}
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT (Ctrl+C)"),
        Err(err) => {
            // Without a listener there is nothing to wait for; park forever so
            // the caller only ends on cancellation.
            error!("Failed to listen for SIGINT: {}", err);
            std::future::pending::<()>().await;
        }
    }
}

/// Waits for a background task, giving up after `timeout`.
///
/// Returns `None` when the task did not finish in time or panicked.
pub async fn join_with_timeout<T>(handle: JoinHandle<T>, timeout: Duration) -> Option<T> {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(join_error)) => {
            error!("Background task failed: {}", join_error);
            None
        }
        Err(_) => {
            error!("Shutdown timeout exceeded");
            None
        }
    }
}
