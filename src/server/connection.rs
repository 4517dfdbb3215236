// Connection handling module
// Serves a single accepted TCP connection with the application's hooks

use hyper::body::Incoming;
use hyper::header::HeaderMap;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::App;
use crate::config::PerformanceConfig;
use crate::http::HttpResponse;
use crate::logger;

/// Client address, attached to every request as an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddr(pub SocketAddr);

/// Per-connection HTTP settings
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub keep_alive: bool,
    /// Limit for receiving a request head, `None` waits forever.
    /// Never applies while a response is being written.
    pub header_read_timeout: Option<Duration>,
}

impl From<&PerformanceConfig> for ConnectionSettings {
    fn from(cfg: &PerformanceConfig) -> Self {
        Self {
            keep_alive: cfg.keep_alive,
            header_read_timeout: (cfg.header_read_timeout > 0)
                .then(|| Duration::from_secs(cfg.header_read_timeout)),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            keep_alive: true,
            header_read_timeout: None,
        }
    }
}

/// Decrements the active connection counter when dropped
struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Serves HTTP/1.1 on it, passing each request head to `app.route`
/// 3. Runs `app.finalize` on every response before hyper writes it
/// 4. Applies the optional request head timeout
/// 5. Releases its slot in `active` when done, on every exit path
pub fn spawn_connection<R, Fut, F>(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    app: Arc<App<R, F>>,
    settings: ConnectionSettings,
    active: &Arc<AtomicUsize>,
) where
    R: Fn(Request<()>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
    F: Fn(&mut HeaderMap) + Send + Sync + 'static,
{
    let guard = ConnectionGuard::new(active);

    tokio::spawn(async move {
        let _guard = guard;
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(settings.keep_alive);
        if let Some(limit) = settings.header_read_timeout {
            builder.timer(TokioTimer::new()).header_read_timeout(limit);
        }

        let service = service_fn(move |req: Request<Incoming>| {
            let app = Arc::clone(&app);
            async move {
                // GET and HEAD carry no body; only the head is routed
                let (mut parts, _body) = req.into_parts();
                parts.extensions.insert(PeerAddr(peer_addr));

                let mut response = (app.route)(Request::from_parts(parts, ())).await;
                (app.finalize)(response.headers_mut());
                Ok::<_, Infallible>(response)
            }
        });

        if let Err(err) = builder.serve_connection(io, service).await {
            // Clients hanging up mid-transfer is routine for video players
            if err.is_timeout() {
                logger::log_debug(&format!(
                    "Connection from {peer_addr} sent no request head in time"
                ));
            } else if err.is_incomplete_message() || err.is_canceled() {
                logger::log_debug(&format!("Connection from {peer_addr} ended early: {err}"));
            } else {
                logger::log_connection_error(&err);
            }
        }
    });
}
