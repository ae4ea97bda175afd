use anyhow::{Context, Result};
use axum::Router;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            warn!("Received SIGTERM, shutting down");
        },
    }
}

/// Serve `router` on `listener` until SIGINT or SIGTERM, then drain in-flight requests.
pub async fn serve_until_signal(listener: TcpListener, router: Router) -> Result<()> {
    let address = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("Listening on {}", address);

    if let Err(err) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Error shutting down: {}", err);
        return Err(err).context("Server error");
    }

    info!("Shutdown complete");
    Ok(())
}
