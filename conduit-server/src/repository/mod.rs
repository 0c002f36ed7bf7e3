//! Repository Module
//!
//! Data access layer for the server.
//! A [`ResourceStore`] persists one kind of locally owned resource; the
//! in-memory and PostgreSQL stores implement it for every kind.

pub mod memory;
pub mod postgres;

// Re-export for convenience
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use conduit_core::domain::{LabelSelector, Resource};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by resource stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The caller's resource version is stale
    #[error("conflict updating {0}: resource version is stale")]
    Conflict(String),

    #[error("resource has neither name nor generateName")]
    MissingName,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to encode resource: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence for one resource kind
///
/// Cluster-scoped resources (projects) use the empty namespace.
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<R>>;

    /// Every resource in `namespace` whose labels match `selector`
    async fn list(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<R>>;

    /// Stores a new resource
    ///
    /// An empty name is derived from `generate_name` plus a random suffix.
    /// The stored copy gets `resource_version = 1` and a creation time.
    async fn create(&self, resource: R) -> Result<R>;

    /// Replaces a stored resource if its resource version still matches
    async fn update(&self, resource: R) -> Result<R>;

    /// Returns whether anything was deleted
    async fn delete(&self, namespace: &str, name: &str) -> Result<bool>;
}

/// Length of the random suffix appended to `generate_name`
pub const NAME_SUFFIX_LEN: usize = 5;

/// `generate_name` plus a random lowercase alphanumeric suffix
pub fn generate_name(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &suffix[..NAME_SUFFIX_LEN])
}

/// "kind namespace/name" for error messages
pub(crate) fn describe<R: Resource>(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        format!("{} {}", R::KIND, name)
    } else {
        format!("{} {}/{}", R::KIND, namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::domain::project::Project;

    #[test]
    fn test_generate_name_appends_suffix() {
        let name = generate_name("demo");
        assert!(name.starts_with("demo"));
        assert_eq!(name.len(), "demo".len() + NAME_SUFFIX_LEN);
        assert!(name[4..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe::<Project>("", "demo"), "project demo");
    }
}
