use tracing_subscriber::EnvFilter;

use university_api::config;
use university_api::database::DatabaseManager;
use university_api::routes::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT secrets, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("university_api=info,tower_http=info")),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting University API in {:?} mode", config.environment);
    let missing_secrets =
        config.security.jwt_access_secret.is_empty() || config.security.jwt_refresh_secret.is_empty();
    if missing_secrets && config.is_production() {
        anyhow::bail!("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must be set in production");
    }
    if missing_secrets {
        tracing::warn!("JWT secrets are not configured; logins will fail until JWT_ACCESS_SECRET and JWT_REFRESH_SECRET are set");
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("University API listening on http://{}", bind_addr);

    axum::serve(listener, app())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close_all().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
