//! HTTP server hosting one service router.
//!
//! This module provides the main [`Server`] type that accepts connections,
//! runs each request through the middleware chain and the router, and
//! records one server span per request.
//!
//! # Features
//!
//! - **HTTP/1.1 and HTTP/2** - Automatic protocol detection
//! - **Graceful Shutdown** - Connection draining with configurable timeout
//! - **Panic Recovery** - Handler panics become `500` responses
//! - **Trace Propagation** - W3C `traceparent` in and out
//!
//! # Example
//!
//! ```rust,ignore
//! use observability_demo::server::{Server, Router};
//!
//! let server = Arc::new(Server::new(config.server, router).with_access_log(true));
//! let listener = server.bind()?;
//! tokio::spawn({
//!     let server = Arc::clone(&server);
//!     async move { server.serve(listener).await }
//! });
//!
//! // Trigger shutdown
//! server.trigger_shutdown();
//!
//! // Wait for connections to drain (with timeout)
//! server.wait_for_drain(Duration::from_secs(30)).await;
//! ```

mod connection;
pub mod routing;
pub mod signal;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, SockRef, Socket, TcpKeepalive, Type};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub use routing::{Handler, RouteMatch, Router, RoutingError, StaticMessage};

use connection::{ConnectionContext, ConnectionGuard};

use crate::config::ServerConfig;
use crate::core::Result;
use crate::middleware::{
    AccessLogMiddleware, MiddlewareChain, RecoveryMode, TraceHeadersMiddleware,
};

/// HTTP server for one service.
pub struct Server {
    config: ServerConfig,
    router: Arc<Router>,
    /// Panic recovery behaviour
    recovery: RecoveryMode,
    /// Access logging enabled (ACCESS_LOG=1)
    access_log_enabled: bool,
    /// Active connections counter
    active_connections: Arc<AtomicUsize>,
    /// Shutdown signal sender
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver (cloneable)
    shutdown_rx: watch::Receiver<bool>,
    /// Shutdown initiated flag
    shutdown_initiated: AtomicBool,
}

impl Server {
    /// Create a new server with the given configuration and routes.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            router: Arc::new(router),
            recovery: RecoveryMode::default(),
            access_log_enabled: true,
            active_connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
            shutdown_rx,
            shutdown_initiated: AtomicBool::new(false),
        }
    }

    /// Set how handler panics are reported.
    pub fn with_recovery(mut self, mode: RecoveryMode) -> Self {
        self.recovery = mode;
        self
    }

    /// Enable or disable access logging.
    pub fn with_access_log(mut self, enabled: bool) -> Self {
        self.access_log_enabled = enabled;
        self
    }

    /// Get current active connections count.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Get the configured drain timeout.
    pub fn drain_timeout(&self) -> Duration {
        self.config.drain_timeout
    }

    /// Whether shutdown has been triggered.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Create the listening socket on the configured address.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(&self) -> Result<TcpListener> {
        let std_listener = create_listener(self.config.listen_addr)?;
        Ok(TcpListener::from_std(std_listener)?)
    }

    fn middleware_chain(&self) -> MiddlewareChain {
        MiddlewareChain::new()
            .add(AccessLogMiddleware::with_enabled(self.access_log_enabled))
            .add(TraceHeadersMiddleware::new())
    }

    /// Accept connections until shutdown is triggered.
    ///
    /// The listener is dropped on return; connections already accepted keep
    /// running and are told to finish gracefully.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let ctx = Arc::new(ConnectionContext {
            router: Arc::clone(&self.router),
            chain: self.middleware_chain(),
            recovery: self.recovery,
            header_timeout: self.config.header_timeout,
        });

        let mut shutdown_rx = self.shutdown_rx.clone();
        if *shutdown_rx.borrow() {
            return Ok(());
        }

        info!(
            "Server listening on http://{} ({} routes)",
            listener.local_addr()?,
            self.router.len()
        );

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, remote_addr) = match result {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("Accept error: {}", e);
                            continue;
                        }
                    };

                    let _ = stream.set_nodelay(true);

                    // Set TCP keepalive
                    let keepalive = TcpKeepalive::new()
                        .with_time(Duration::from_secs(5))
                        .with_interval(Duration::from_secs(1));
                    let sock_ref = SockRef::from(&stream);
                    let _ = sock_ref.set_tcp_keepalive(&keepalive);

                    // Counted before spawning so a drain never misses it
                    let guard = ConnectionGuard::new(&self.active_connections);
                    let ctx = Arc::clone(&ctx);
                    let conn_shutdown = self.shutdown_rx.clone();

                    tokio::spawn(async move {
                        ctx.handle_connection(stream, remote_addr, conn_shutdown, guard).await;
                    });
                }
                _ = shutdown_rx.changed() => {
                    debug!("Received shutdown signal, stopping accept loop");
                    break;
                }
            }
        }

        drop(listener);
        Ok(())
    }

    /// Trigger graceful shutdown.
    /// Signals the accept loop and every open connection.
    pub fn trigger_shutdown(&self) {
        if self.shutdown_initiated.swap(true, Ordering::SeqCst) {
            return; // Already initiated
        }
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for all active connections to drain.
    /// Returns true if drained successfully, false if timeout was reached.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        let check_interval = Duration::from_millis(50);

        loop {
            let active = self.active_connections.load(Ordering::SeqCst);
            if active == 0 {
                return true;
            }

            if start.elapsed() >= timeout {
                warn!("Drain timeout reached with {} active connections", active);
                return false;
            }

            debug!("Waiting for {} connections to drain...", active);
            tokio::time::sleep(check_interval).await;
        }
    }
}

/// Creates a non-blocking listening socket with SO_REUSEADDR.
fn create_listener(addr: SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;

    Ok(socket.into())
}
