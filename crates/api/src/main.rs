use std::sync::Arc;

use anyhow::Context;

use oysters_infra::config::AppConfig;
use oysters_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging first so configuration warnings are not lost.
    let format = LogFormat::from_setting(std::env::var("LOG_FORMAT").ok().as_deref());
    oysters_observability::init(format.clone().unwrap_or_default());
    format.context("invalid configuration: LOG_FORMAT")?;

    let config = AppConfig::from_env().context("invalid configuration")?;

    let bind_addr = config.bind_addr;
    let services = Arc::new(
        oysters_api::app::services::build_services(config).context("failed to start background workers")?,
    );
    let app = oysters_api::app::router(services.clone());

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

    services.shutdown();
    Ok(())
}
