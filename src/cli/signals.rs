//! Shutdown signals (Ctrl+C or SIGTERM)

use std::future::Future;
use tracing::{info, warn};

/// Wait for the next shutdown signal
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Resolve on the first signal, then call `force` if another one arrives
///
/// The first signal starts a graceful shutdown. Cleanup after that is not
/// interruptible, so a second signal is the operator's only way out of a
/// hung teardown.
pub async fn interrupt_then_force<S, Fut, F>(mut next_signal: S, force: F)
where
    S: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
    F: FnOnce() + Send + 'static,
{
    next_signal().await;
    tokio::spawn(async move {
        next_signal().await;
        warn!("Second shutdown signal received, exiting without waiting for cleanup");
        force();
    });
}
