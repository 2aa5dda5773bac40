// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// How often the drain loop re-checks the active connection count
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept loop for the simulator server
///
/// Runs until `shutdown` completes, then drops the listener so no new
/// connections are queued. Accept errors are logged and the loop keeps going.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop<S>(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: S,
) where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = &mut shutdown => {
                logger::log_shutdown_started();
                break;
            }
        }
    }

    drop(listener);
}

/// Wait for in-flight connections to finish, up to `grace`
///
/// Returns `true` when every connection closed before the deadline.
pub async fn wait_for_connections(active_connections: &AtomicUsize, grace: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + grace;

    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutdown grace period elapsed with {remaining} connection(s) still open"
            ));
            return false;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_returns_when_idle() {
        let counter = AtomicUsize::new(0);
        assert!(wait_for_connections(&counter, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_wait_gives_up_after_grace() {
        let counter = AtomicUsize::new(2);
        assert!(!wait_for_connections(&counter, Duration::from_millis(120)).await);
    }

    #[tokio::test]
    async fn test_wait_sees_connections_close() {
        let counter = Arc::new(AtomicUsize::new(1));
        let closer = Arc::clone(&counter);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            closer.fetch_sub(1, Ordering::SeqCst);
        });
        assert!(wait_for_connections(&counter, Duration::from_secs(5)).await);
    }
}
