//! PostgreSQL resource store
//!
//! Every kind lives in the `resources` table as a JSONB document. Labels are
//! duplicated into their own column so selectors run as `labels @> $n`.

use async_trait::async_trait;
use chrono::Utc;
use conduit_core::domain::{LabelSelector, Resource};
use sqlx::PgPool;
use std::marker::PhantomData;

use super::{ResourceStore, Result, StoreError, describe, generate_name};

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

pub struct PgStore<R> {
    pool: PgPool,
    _kind: PhantomData<fn() -> R>,
}

impl<R> PgStore<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _kind: PhantomData,
        }
    }
}

impl<R> Clone for PgStore<R> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for PgStore<R> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<R>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT body
            FROM resources
            WHERE kind = $1 AND namespace = $2 AND name = $3
            "#,
        )
        .bind(R::KIND.as_str())
        .bind(namespace)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ResourceRow::decode).transpose()
    }

    async fn list(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<R>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT body
            FROM resources
            WHERE kind = $1 AND namespace = $2 AND labels @> $3
            ORDER BY created_at ASC, name ASC
            "#,
        )
        .bind(R::KIND.as_str())
        .bind(namespace)
        .bind(serde_json::to_value(selector.requirements())?)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ResourceRow::decode).collect()
    }

    async fn create(&self, mut resource: R) -> Result<R> {
        let meta = resource.meta_mut();
        if meta.name.is_empty() {
            if meta.generate_name.is_empty() {
                return Err(StoreError::MissingName);
            }
            meta.name = generate_name(&meta.generate_name);
        }
        meta.resource_version = 1;
        let created_at = Utc::now();
        meta.created_at = Some(created_at);

        let (namespace, name) = (meta.namespace.clone(), meta.name.clone());
        let result = sqlx::query(
            r#"
            INSERT INTO resources (kind, namespace, name, body, labels, resource_version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(R::KIND.as_str())
        .bind(&namespace)
        .bind(&name)
        .bind(serde_json::to_value(&resource)?)
        .bind(serde_json::to_value(&resource.meta().labels)?)
        .bind(1_i64)
        .bind(created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(resource),
            Err(sqlx::Error::Database(err)) if err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(StoreError::AlreadyExists(describe::<R>(&namespace, &name)))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn update(&self, mut resource: R) -> Result<R> {
        let expected = resource.meta().resource_version;
        let stored = self
            .get(&resource.meta().namespace, &resource.meta().name)
            .await?;
        let stored = stored.ok_or_else(|| {
            StoreError::NotFound(describe::<R>(
                &resource.meta().namespace,
                &resource.meta().name,
            ))
        })?;

        let meta = resource.meta_mut();
        meta.resource_version = expected + 1;
        meta.created_at = stored.meta().created_at;

        let meta = resource.meta();
        let result = sqlx::query(
            r#"
            UPDATE resources
            SET body = $1, labels = $2, resource_version = $3
            WHERE kind = $4 AND namespace = $5 AND name = $6 AND resource_version = $7
            "#,
        )
        .bind(serde_json::to_value(&resource)?)
        .bind(serde_json::to_value(&meta.labels)?)
        .bind((expected + 1) as i64)
        .bind(R::KIND.as_str())
        .bind(&meta.namespace)
        .bind(&meta.name)
        .bind(expected as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(describe::<R>(
                &meta.namespace,
                &meta.name,
            )));
        }

        Ok(resource)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM resources WHERE kind = $1 AND namespace = $2 AND name = $3")
                .bind(R::KIND.as_str())
                .bind(namespace)
                .bind(name)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ResourceRow {
    body: serde_json::Value,
}

impl ResourceRow {
    fn decode<R: Resource>(self) -> Result<R> {
        Ok(serde_json::from_value(self.body)?)
    }
}
