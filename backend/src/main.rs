//! ABC Cours CRM Backend Service
//!
//! Main entry point for the tutoring CRM backend.
//! This service provides:
//! - REST/JSON API for families, students, professors and subjects
//! - Settlement notes with coupon-based billing
//! - Bearer-token authentication for back-office users

use abc_crm_backend::config::AppConfig;
use abc_crm_backend::database::{create_pool, run_migrations};
use abc_crm_backend::{build_router, AppState};
use anyhow::Context;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("abc_crm_backend={},sqlx=warn", config.log_level).into()
    });

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received, shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    init_tracing(&config);

    info!("ABC Cours CRM backend starting");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");
    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;
    info!(
        "Database connection pool created (max connections: {})",
        config.database.max_connections
    );

    info!("Running database migrations...");
    run_migrations(&pool, None)
        .await
        .context("Database migration failed")?;
    info!("Database migrations completed successfully");

    // =========================================================================
    // SERVICES
    // =========================================================================
    let state = AppState::new(pool, &config.auth);

    match &config.bootstrap_admin {
        Some(admin) => match state.auth_service.ensure_bootstrap_admin(admin).await {
            Ok(Some(user)) => info!("Seeded admin account {}", user.email),
            Ok(None) => info!("Users already exist, bootstrap admin skipped"),
            Err(e) => return Err(anyhow::anyhow!("Failed to seed bootstrap admin: {}", e)),
        },
        None => warn!("BOOTSTRAP_ADMIN_EMAIL not set, no admin account will be seeded"),
    }

    // =========================================================================
    // HTTP SERVER
    // =========================================================================
    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server on {}", addr))?;

    info!("HTTP API listening on {}", addr);
    info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("ABC Cours CRM backend shutdown complete");
    Ok(())
}
