use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Projects, pipelines and credentials share one document table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resources (
            kind VARCHAR(32) NOT NULL,
            namespace VARCHAR(255) NOT NULL DEFAULT '',
            name VARCHAR(255) NOT NULL,
            body JSONB NOT NULL,
            labels JSONB NOT NULL DEFAULT '{}',
            resource_version BIGINT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (kind, namespace, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_resources_labels ON resources USING GIN (labels)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_resources_created_at ON resources(kind, namespace, created_at)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
