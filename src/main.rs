use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_feeds::config::{Config, WidgetConfig};
use video_feeds::routes::{self, AppState};
use video_feeds::transport::HttpTransport;
use video_feeds::widget::{start_background_refresh, VideosWidget};

const DEFAULT_CONFIG_PATH: &str = "videos.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video_feeds=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("VIDEOS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;
    let listen = config.listen.clone();
    let transport = HttpTransport::new(&config.http)?;

    let widget_config = WidgetConfig::from(config);
    info!(
        youtube = widget_config.youtube_sources.len(),
        rumble = widget_config.rumble_sources.len(),
        style = widget_config.style.key(),
        limit = widget_config.limit,
        "Loaded video sources from configuration"
    );

    let widget = Arc::new(VideosWidget::new(widget_config, Arc::new(transport)));
    let shutdown = CancellationToken::new();

    // Start background refresh task
    let refresh_task = tokio::spawn(start_background_refresh(widget.clone(), shutdown.clone()));

    // Create app state
    let state = Arc::new(AppState {
        widget,
        shutdown: shutdown.clone(),
    });
    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!("Server starting on http://{}", listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    refresh_task.await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
    shutdown.cancel();
}
