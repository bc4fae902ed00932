use anyhow::Context;

use pvz_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    pvz_observability::init_for_env(config.env.as_str());

    let app = pvz_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        env = config.env.as_str(),
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
}
