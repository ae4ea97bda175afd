use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use problem_kit::api::routes::create_router;
use problem_kit::config::Config;
use problem_kit::server::serve_until_signal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,problem_kit=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting problem-kit v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        allow_blank_content_type = config.api.allow_blank_content_type,
        max_body_bytes = config.api.max_body_bytes,
        "Configuration loaded successfully"
    );

    let app = create_router(Arc::new(config.api.clone()));

    let address = config.server_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    serve_until_signal(listener, app).await
}
