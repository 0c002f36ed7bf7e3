use std::sync::Arc;

use anyhow::Context;
use conduit_client::JenkinsClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::service::sync::TracingNotifier;
use crate::service::{ResourceOperator, Stores};

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conduit_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Conduit Server...");

    let config = Config::from_env()?;
    config.validate()?;

    let stores = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(database_url)
                .await
                .context("failed to create database pool")?;

            tracing::info!("Database connection pool created");

            db::run_migrations(&pool)
                .await
                .context("failed to run database migrations")?;

            Stores::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, resources are kept in memory");
            Stores::memory()
        }
    };

    let engine = JenkinsClient::with_timeout(&config.engine_url, config.engine_timeout)
        .context("failed to build engine client")?;

    tracing::info!("Forwarding remote pipeline calls to {}", config.engine_url);

    let operator = ResourceOperator::new(stores, Arc::new(engine))
        .with_notifier(Arc::new(TracingNotifier))
        .with_fanout_concurrency(config.fanout_concurrency)
        .with_agent_labels(config.agent_labels.clone());

    // Build router with all API endpoints
    let app = api::create_router(api::AppState::new(operator));

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
