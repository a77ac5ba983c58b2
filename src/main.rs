//! Standalone server for images stored through the S3 adapter

use anyhow::Context;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ghost_s3_adapter::api::mount_path;
use ghost_s3_adapter::config::{AppConfig, LogFormat};
use ghost_s3_adapter::{S3Adapter, StorageAdapter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    init_tracing(&config)?;

    let adapter = S3Adapter::new(config.storage.clone()).context("invalid storage configuration")?;
    tracing::info!(
        bucket = %adapter.config().bucket,
        region = %adapter.config().region,
        asset_url = %adapter.config().asset_url,
        "Storage adapter initialised",
    );

    let mount = mount_path(&adapter.config().asset_url);
    let router = if mount == "/" {
        adapter.serve()
    } else {
        Router::new().nest_service(&mount, adapter.serve())
    };
    let router = router.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!(%addr, %mount, "Serving stored images");

    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("ghost_s3_adapter=info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }

    Ok(())
}
