// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling and queue draining on shutdown.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Cancel the returned token on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        cancel.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, only Ctrl+C will stop tether");
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, initiating shutdown"),
        Err(e) => {
            // Without a handler there is nothing to wait for; never trigger.
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Wait until the queue goes idle, up to `timeout`.
///
/// Returns `true` if the queue drained in time.
pub async fn wait_for_idle(mut processing: watch::Receiver<bool>, timeout: Duration) -> bool {
    if !*processing.borrow_and_update() {
        info!("no task in flight");
        return true;
    }

    info!(timeout_secs = timeout.as_secs(), "waiting for the running task to finish");
    match tokio::time::timeout(timeout, processing.wait_for(|busy| !busy)).await {
        Ok(Ok(_)) => {
            info!("task queue drained");
            true
        }
        // Sender dropped: the consumer is gone, nothing left to wait for.
        Ok(Err(_)) => true,
        Err(_) => {
            warn!("task still running at shutdown deadline");
            false
        }
    }
}
