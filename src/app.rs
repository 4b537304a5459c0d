//! Process lifecycle shared by the service binaries.
//!
//! Startup order: configuration, runtime, telemetry, logging, listener.
//! Shutdown order: stop accepting, drain connections, flush spans.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::logging;
use crate::observability::init_tracing;
use crate::server::signal::wait_for_signal;
use crate::server::Server;
use crate::services::Service;

/// Error type at the binary edge.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Load configuration, build the runtime and run `service` until a
/// termination signal arrives.
pub fn run(service: Service) -> Result<(), BoxError> {
    let config = Config::from_env(service.name(), service.default_port())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(serve(service, config))
}

/// Async part of [`run`].
pub async fn serve(service: Service, config: Config) -> Result<(), BoxError> {
    let telemetry = init_tracing(&config.telemetry)?;
    logging::init(&config.logging, telemetry.tracer())?;
    telemetry.log_status(&config.telemetry);

    info!("Starting {} service v{}", service, crate::PKG_VERSION);
    config.log_summary();

    let server = Server::new(config.server.clone(), service.router()?)
        .with_recovery(service.recovery())
        .with_access_log(config.middleware.access_log);
    let server = Arc::new(server);

    let listener = server.bind().map_err(|e| {
        error!("listen: {}", e);
        e
    })?;

    let accept_loop = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.serve(listener).await }
    });

    let signal = wait_for_signal().await?;
    info!("signal is: {}", signal);
    info!("Shutting down app...");

    server.trigger_shutdown();

    match accept_loop.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Server error: {}", e),
        Err(e) => error!("Accept loop task failed: {}", e),
    }

    if !server.wait_for_drain(server.drain_timeout()).await {
        warn!("App forced to shutdown");
    }

    if let Err(e) = telemetry.shutdown().await {
        error!("Tracer provider shutdown failed: {}", e);
        return Err(e.into());
    }

    info!("App exiting");
    Ok(())
}
