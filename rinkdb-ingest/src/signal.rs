use log::{info, warn};

/// Resolves when the process is asked to shut down.
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => warn!("Failed to listen for shutdown signal: {err}"),
    }
}
