use anyhow::{Context, Result};
use event_localization::{
    config::Config,
    http::{create_router, AppState},
    pipeline::LocalizationPipeline,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("event_localization=info".parse()?),
        )
        .init();

    info!("Starting event localization service");

    let config = Arc::new(Config::from_env()?);
    let pipeline = Arc::new(LocalizationPipeline::from_config(&config).await?);

    info!(
        "Locales: {:?} (default {}, fallback {:?})",
        config.supported_locales, config.default_locale, config.fallback_order
    );
    if pipeline.translator().is_enabled() {
        info!(
            "Machine translation enabled, glossary has {} entries",
            pipeline.translator().glossary().len()
        );
    } else {
        info!("Machine translation disabled; missing locales fall back on read");
    }

    let app = create_router(AppState {
        pipeline,
        config: config.clone(),
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
