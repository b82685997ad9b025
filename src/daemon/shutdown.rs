use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Detects signals sent to the process and turns them into a cancellation of `cancelation`.
/// Returns early when the token is cancelled by someone else.
///
/// On Windows detached processes can't detect signals sent to them, so `stop` there ends the
/// process forcefully and the entry that was still open is lost.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = termination_requested() => {
            info!("Shutdown requested");
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for interrupts {e:?}");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn termination_requested() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            select! {
                _ = interrupt() => (),
                _ = terminate.recv() => (),
            }
        }
        Err(e) => {
            error!("Failed to listen for SIGTERM {e:?}");
            interrupt().await
        }
    }
}

#[cfg(not(unix))]
async fn termination_requested() {
    interrupt().await
}
