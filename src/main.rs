use secrecy::ExposeSecret;
use std::{net::SocketAddr, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxtools::api::middleware::session::{create_session_layer, AppState};
use taxtools::config::Config;
use taxtools::db;
use taxtools::jobs::tax_history_sync;
use taxtools::services::esi::EsiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taxtools=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tax Tools server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Create database pool
    let pool = db::create_pool(config.database_url.expose_secret()).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create session layer
    let session_layer = create_session_layer(pool.clone()).await?;
    tracing::info!("Session layer initialized");

    let esi = EsiClient::new(
        &config.esi_base_url,
        &config.esi_user_agent,
        Duration::from_secs(config.esi_timeout_secs),
    )?;

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler =
        tax_history_sync::start_scheduler(pool.clone(), esi.clone(), &config.tax_sync_cron).await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        esi,
    };

    let app = taxtools::api::app(state, session_layer);

    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, cleaning up...");
}
