use std::future::{Future, pending};
use std::io;
use tracing::{error, info};

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it.
/// A listener that cannot be installed never fires.
pub async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c(), terminate()).await
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Failed to listen for SIGTERM: {}", e);
            pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    pending::<()>().await;
}

async fn wait_for_shutdown<C, T>(ctrl_c: C, terminate: T)
where
    C: Future<Output = io::Result<()>>,
    T: Future<Output = ()>,
{
    let ctrl_c = async {
        match ctrl_c.await {
            Ok(()) => info!("Received Ctrl-C"),
            Err(e) => {
                error!("Failed to listen for Ctrl-C: {}", e);
                pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn ctrl_c_triggers_shutdown() {
        wait_for_shutdown(async { Ok(()) }, pending::<()>()).await;
    }

    #[tokio::test]
    async fn terminate_triggers_shutdown() {
        wait_for_shutdown(pending::<io::Result<()>>(), async {}).await;
    }

    #[tokio::test(start_paused = true)]
    async fn broken_ctrl_c_listener_does_not_shut_down() {
        let waiting = wait_for_shutdown(
            async { Err(io::Error::other("no signal handler")) },
            pending::<()>(),
        );
        assert!(timeout(Duration::from_secs(3600), waiting).await.is_err());
    }
}
