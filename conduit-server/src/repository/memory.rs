//! In-memory resource store
//!
//! Used when no database is configured, and by tests.

use async_trait::async_trait;
use chrono::Utc;
use conduit_core::domain::{LabelSelector, Resource};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{ResourceStore, Result, StoreError, describe, generate_name};

/// Resources keyed by (namespace, name)
pub struct MemoryStore<R> {
    state: Arc<Mutex<State<R>>>,
}

struct State<R> {
    /// Each entry carries its insertion sequence, used to order
    /// resources created within the same clock tick
    entries: BTreeMap<(String, String), (u64, R)>,
    next_seq: u64,
}

impl<R> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                entries: BTreeMap::new(),
                next_seq: 0,
            })),
        }
    }
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for MemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for MemoryStore<R> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<R>> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .get(&(namespace.to_string(), name.to_string()))
            .map(|(_, resource)| resource.clone()))
    }

    async fn list(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<R>> {
        let state = self.state.lock().await;
        let mut items: Vec<&(u64, R)> = state
            .entries
            .iter()
            .filter(|((ns, _), (_, resource))| {
                ns == namespace && selector.matches(&resource.meta().labels)
            })
            .map(|(_, entry)| entry)
            .collect();
        items.sort_by(|(a_seq, a), (b_seq, b)| {
            a.meta()
                .created_at
                .cmp(&b.meta().created_at)
                .then_with(|| a_seq.cmp(b_seq))
        });
        Ok(items.into_iter().map(|(_, resource)| resource.clone()).collect())
    }

    async fn create(&self, mut resource: R) -> Result<R> {
        let mut state = self.state.lock().await;
        let meta = resource.meta_mut();

        if meta.name.is_empty() {
            if meta.generate_name.is_empty() {
                return Err(StoreError::MissingName);
            }
            meta.name = loop {
                let candidate = generate_name(&meta.generate_name);
                if !state
                    .entries
                    .contains_key(&(meta.namespace.clone(), candidate.clone()))
                {
                    break candidate;
                }
            };
        }

        let key = (meta.namespace.clone(), meta.name.clone());
        if state.entries.contains_key(&key) {
            return Err(StoreError::AlreadyExists(describe::<R>(&key.0, &key.1)));
        }

        meta.resource_version = 1;
        meta.created_at = Some(Utc::now());

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(key, (seq, resource.clone()));
        Ok(resource)
    }

    async fn update(&self, mut resource: R) -> Result<R> {
        let mut state = self.state.lock().await;
        let meta = resource.meta_mut();
        let key = (meta.namespace.clone(), meta.name.clone());

        let (seq, stored) = state
            .entries
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(describe::<R>(&key.0, &key.1)))?;
        if stored.meta().resource_version != meta.resource_version {
            return Err(StoreError::Conflict(describe::<R>(&key.0, &key.1)));
        }

        let seq = *seq;
        meta.resource_version += 1;
        meta.created_at = stored.meta().created_at;
        state.entries.insert(key, (seq, resource.clone()));
        Ok(resource)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(state
            .entries
            .remove(&(namespace.to_string(), name.to_string()))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::domain::pipeline::Pipeline;
    use conduit_core::domain::project::Project;

    #[tokio::test]
    async fn test_create_assigns_name_version_and_time() {
        let store = MemoryStore::<Project>::new();
        let created = store.create(Project::new("demo")).await.unwrap();

        assert!(created.metadata.name.starts_with("demo"));
        assert_eq!(created.metadata.name.len(), 9);
        assert_eq!(created.metadata.resource_version, 1);
        assert!(created.metadata.created_at.is_some());

        let fetched = store.get("", &created.metadata.name).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = MemoryStore::<Pipeline>::new();
        store.create(Pipeline::new("ns", "build")).await.unwrap();
        let err = store.create(Pipeline::new("ns", "build")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));

        // Same name in another namespace is fine
        assert!(store.create(Pipeline::new("other", "build")).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_without_any_name_fails() {
        let store = MemoryStore::<Project>::new();
        let err = store.create(Project::new("")).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingName));
    }

    #[tokio::test]
    async fn test_update_is_optimistic() {
        let store = MemoryStore::<Pipeline>::new();
        let created = store.create(Pipeline::new("ns", "build")).await.unwrap();

        let updated = store.update(created.clone()).await.unwrap();
        assert_eq!(updated.metadata.resource_version, 2);

        // `created` still carries version 1
        let err = store.update(created).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::<Pipeline>::new();
        let err = store.update(Pipeline::new("ns", "ghost")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_namespace_and_labels() {
        let store = MemoryStore::<Pipeline>::new();
        let mut labeled = Pipeline::new("ns", "b");
        labeled
            .metadata
            .labels
            .insert("app".to_string(), "web".to_string());
        store.create(Pipeline::new("ns", "a")).await.unwrap();
        store.create(labeled).await.unwrap();
        store.create(Pipeline::new("other", "c")).await.unwrap();

        let all = store
            .list("ns", &LabelSelector::everything())
            .await
            .unwrap();
        let names: Vec<_> = all.iter().map(|p| p.metadata.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let selected = store
            .list("ns", &LabelSelector::everything().with("app", "web"))
            .await
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].metadata.name, "b");
    }

    #[tokio::test]
    async fn test_list_keeps_creation_order() {
        let store = MemoryStore::<Pipeline>::new();
        // Reverse alphabetical, so ordering by name would flip them
        let names: Vec<String> = (0..32).rev().map(|i| format!("p{:02}", i)).collect();
        for name in &names {
            store.create(Pipeline::new("ns", name.as_str())).await.unwrap();
        }

        let listed: Vec<String> = store
            .list("ns", &LabelSelector::everything())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.metadata.name)
            .collect();
        assert_eq!(listed, names);
    }

    #[tokio::test]
    async fn test_update_keeps_list_position() {
        let store = MemoryStore::<Pipeline>::new();
        let first = store.create(Pipeline::new("ns", "b")).await.unwrap();
        store.create(Pipeline::new("ns", "a")).await.unwrap();
        store.update(first).await.unwrap();

        let listed = store
            .list("ns", &LabelSelector::everything())
            .await
            .unwrap();
        assert_eq!(listed[0].metadata.name, "b");
        assert_eq!(listed[1].metadata.name, "a");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::<Pipeline>::new();
        store.create(Pipeline::new("ns", "build")).await.unwrap();
        assert!(store.delete("ns", "build").await.unwrap());
        assert!(!store.delete("ns", "build").await.unwrap());
    }
}
