// Server module entry
// Listener setup, accept loop, connection handling and graceful shutdown

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file is mounted under another name
#[path = "loop.rs"]
pub mod server_loop;

use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::AppState;

pub use listener::create_listener;
pub use signal::wait_for_shutdown;

/// Serve until `shutdown` resolves, then give open connections
/// `performance.shutdown_grace` seconds to finish.
///
/// Must run inside a `LocalSet`; connections are spawned with `spawn_local`.
pub async fn run<S>(listener: TcpListener, state: Arc<AppState>, shutdown: S)
where
    S: Future<Output = ()>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    let grace = Duration::from_secs(state.config.performance.shutdown_grace);

    server_loop::start_server_loop(
        listener,
        Arc::clone(&state),
        Arc::clone(&active_connections),
        shutdown,
    )
    .await;

    server_loop::wait_for_connections(&active_connections, grace).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    async fn roundtrip(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    /// Read one keep-alive response whose pretty JSON body ends the message
    async fn read_json_response(stream: &mut TcpStream) -> String {
        let mut response = Vec::new();
        let mut chunk = [0_u8; 1024];
        while !String::from_utf8_lossy(&response).ends_with("\n}") {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-response");
            response.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&response).into_owned()
    }

    #[tokio::test]
    async fn test_connection_limit_and_keep_alive() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_defaults();
        config.logging.access_log = false;
        config.performance.shutdown_grace = 1;
        config.performance.max_connections = Some(1);
        let state = Arc::new(AppState::with_root(config, dir.path()));

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(run(listener, state, async move {
                    rx.await.ok();
                }));

                // First connection stays open between requests
                let mut held = TcpStream::connect(addr).await.unwrap();
                held.write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\n\r\n")
                    .await
                    .unwrap();
                let first = read_json_response(&mut held).await;
                assert!(first.starts_with("HTTP/1.1 200 OK"));

                // Second connection is over the limit and closed unanswered
                let mut rejected = TcpStream::connect(addr).await.unwrap();
                let _ = rejected
                    .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\n\r\n")
                    .await;
                let mut bytes = Vec::new();
                let _ = rejected.read_to_end(&mut bytes).await;
                assert!(bytes.is_empty());

                // The held connection still serves a second request
                held.write_all(
                    b"GET /api/stats HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await
                .unwrap();
                let mut second = Vec::new();
                held.read_to_end(&mut second).await.unwrap();
                let second = String::from_utf8_lossy(&second);
                assert!(second.starts_with("HTTP/1.1 200 OK"));
                assert!(second.contains("\"major_number\": 250"));

                tx.send(()).unwrap();
                server.await.unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>device</h1>").unwrap();
        let mut config = Config::from_defaults();
        config.logging.access_log = false;
        config.performance.shutdown_grace = 1;
        let state = Arc::new(AppState::with_root(config, dir.path()));

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(run(listener, state, async move {
                    rx.await.ok();
                }));

                let health = roundtrip(
                    addr,
                    "GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(health.starts_with("HTTP/1.1 200 OK"));
                assert!(health.contains("\"healthy\""));
                assert!(health.to_ascii_lowercase().contains("access-control-allow-origin: *"));

                let index = roundtrip(
                    addr,
                    "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(index.starts_with("HTTP/1.1 200 OK"));
                assert!(index.ends_with("<h1>device</h1>"));

                let missing = roundtrip(
                    addr,
                    "GET /missing.png HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(missing.starts_with("HTTP/1.1 404"));

                tx.send(()).unwrap();
                server.await.unwrap();

                assert!(TcpStream::connect(addr).await.is_err());
            })
            .await;
    }
}
