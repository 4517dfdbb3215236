// Server module entry point
// Listener setup, accept loop, per-connection tasks and graceful shutdown

pub mod connection;
pub mod listener;
pub mod signal;

use hyper::header::HeaderMap;
use hyper::Request;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::{AppState, Config};
use crate::error::{Result, ServerError};
use crate::handler;
use crate::http::{DefaultHeaders, HttpResponse};
use crate::logger;

// Re-export commonly used types
pub use connection::{ConnectionSettings, PeerAddr};
pub use listener::create_listener;

/// How often the shutdown drain checks for remaining connections
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The two hooks a server is composed from
///
/// `route` turns a request head into a response; `finalize` runs on every
/// response afterwards, whatever produced it.
pub struct App<R, F> {
    pub route: R,
    pub finalize: F,
}

impl<R, Fut, F> App<R, F>
where
    R: Fn(Request<()>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
    F: Fn(&mut HeaderMap) + Send + Sync + 'static,
{
    pub const fn new(route: R, finalize: F) -> Self {
        Self { route, finalize }
    }
}

/// Boxed future returned by [`video_app`]'s router
pub type RouteFuture = Pin<Box<dyn Future<Output = HttpResponse> + Send>>;

/// Compose the video server: request router plus the always-on headers
pub fn video_app(
    state: Arc<AppState>,
) -> App<
    impl Fn(Request<()>) -> RouteFuture + Send + Sync + 'static,
    impl Fn(&mut HeaderMap) + Send + Sync + 'static,
> {
    let defaults = DefaultHeaders::new(&state.config.http.server_name);
    App::new(
        move |req: Request<()>| -> RouteFuture {
            Box::pin(handler::handle_request(req, Arc::clone(&state)))
        },
        move |headers: &mut HeaderMap| defaults.apply(headers),
    )
}

/// Accept loop
///
/// Runs until `shutdown` is notified, then waits up to `grace` for
/// in-flight connections to finish.
#[allow(clippy::ignored_unit_patterns)]
pub async fn serve<R, Fut, F>(
    listener: TcpListener,
    app: App<R, F>,
    settings: ConnectionSettings,
    shutdown: Arc<Notify>,
    grace: Duration,
) where
    R: Fn(Request<()>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
    F: Fn(&mut HeaderMap) + Send + Sync + 'static,
{
    let app = Arc::new(app);
    let active = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        logger::log_debug(&format!("Accepted connection from {peer_addr}"));
                        connection::spawn_connection(
                            stream,
                            peer_addr,
                            Arc::clone(&app),
                            settings,
                            &active,
                        );
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            _ = shutdown.notified() => break,
        }
    }

    drop(listener);
    drain_connections(&active, grace).await;
}

async fn drain_connections(active: &AtomicUsize, grace: Duration) {
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        let remaining = active.load(Ordering::SeqCst);
        if remaining == 0 {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutdown grace period elapsed with {remaining} connection(s) still open"
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

/// Start the server described by `config` and run until a shutdown signal
///
/// The logger should already be initialized.
pub async fn run(config: Config) -> Result<()> {
    let addr = config.get_socket_addr()?;
    let state = Arc::new(AppState::new(&config));
    if !state.root.is_dir() {
        return Err(ServerError::InvalidRoot {
            path: config.serve.root.clone(),
        });
    }

    let listener = create_listener(addr)?;
    logger::log_server_start(&listener.local_addr()?, &config);

    let shutdown = Arc::new(Notify::new());
    signal::start_signal_handler(Arc::clone(&shutdown));

    let settings = ConnectionSettings::from(&config.performance);
    let grace = Duration::from_secs(config.performance.shutdown_timeout);
    serve(listener, video_app(state), settings, shutdown, grace).await;

    logger::log_info("Server stopped");
    Ok(())
}
