//! Tripledger API server binary
//!
//! Startup sequence:
//! 1. Initialize tracing
//! 2. Load configuration from the environment
//! 3. Connect the database pool and run migrations
//! 4. Create the admin account if absent
//! 5. Serve the router until ctrl-c

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripledger_api::{
    app::{build_router, AppState},
    config::Config,
    routes::auth::ensure_admin,
};
use tripledger_shared::db::{
    migrations::run_migrations,
    pool::{create_pool, DatabaseConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripledger_api=info,tripledger_shared=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        host = %config.api.host,
        port = config.api.port,
        "Starting tripledger API server"
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    if ensure_admin(&pool, &config.admin).await? {
        tracing::info!(username = %config.admin.username, "Bootstrapped admin account");
    }

    let bind_address = config.bind_address();
    let state = AppState::new(pool, config);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Listening on {}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install ctrl-c handler: {}", e);
        return;
    }

    tracing::info!("Shutdown signal received");
}
