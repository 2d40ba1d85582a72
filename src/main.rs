use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use art_screener::config::AppConfig;
use art_screener::routes::configure_routes;
use art_screener::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    info!("Initializing state...");
    let address = config.bind_address();
    let state = AppState::from_config(config)
        .await
        .context("Failed to initialize services")?;

    // Sweep expired sessions at a tenth of their lifetime, at least once a minute
    let sweep_period = (state.sessions.ttl() / 10).clamp(Duration::from_secs(1), Duration::from_secs(60));
    let sweeper = state.spawn_session_sweeper(sweep_period);

    let routes = configure_routes(state);
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(address, shutdown_signal())
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Server running on http://{}", bound);
    server.await;

    sweeper.abort();
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
