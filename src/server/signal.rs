// Signal handling module
//
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
// Non-Unix platforms only get Ctrl+C.

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Spawn a task that notifies `shutdown` once a termination signal arrives
///
/// `notify_one` stores a permit, so a signal that lands before the accept loop
/// starts waiting is not lost.
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        let reason = wait_for_signal().await;
        logger::log_shutdown(reason);
        shutdown.notify_one();
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => "SIGTERM received",
                _ = sigint.recv() => "SIGINT received",
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            logger::log_warning(&format!(
                "Failed to register signal handlers ({e}), falling back to Ctrl+C"
            ));
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "Ctrl+C received",
        Err(e) => {
            logger::log_error(&format!("Cannot listen for Ctrl+C: {e}"));
            // Without a signal source the server runs until killed
            std::future::pending().await
        }
    }
}
