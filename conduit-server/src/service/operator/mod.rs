//! Resource Operator
//!
//! Owns the local resource stores and the remote engine client. Local
//! resources (projects, pipelines, credentials) are read and written through
//! the stores; run-oriented operations are proxied to the engine.

mod credential;
mod nodes_detail;
mod pipeline;
mod project;
mod proxy;

#[cfg(test)]
pub(crate) mod fake;

pub use nodes_detail::{NodeWarning, NodesDetailReport};

use conduit_client::RemoteEngine;
use conduit_core::domain::credential::Credential;
use conduit_core::domain::meta::ResourceKind;
use conduit_core::domain::pipeline::Pipeline;
use conduit_core::domain::project::Project;
use conduit_core::domain::{Resource, SyncState, SyncStatus};
use conduit_core::dto::project::SyncOutcome;
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;

use super::error::{OperatorError, Result};
use super::masking::{DefaultSecretMasker, SecretMasker};
use super::sync::{SyncEvent, SyncNotifier, TracingNotifier};
use crate::repository::{MemoryStore, PgStore, ResourceStore};

/// Default bound on concurrent step fetches per run
pub const DEFAULT_FANOUT_CONCURRENCY: usize = 10;

/// One store per resource kind
#[derive(Clone)]
pub struct Stores {
    pub projects: Arc<dyn ResourceStore<Project>>,
    pub pipelines: Arc<dyn ResourceStore<Pipeline>>,
    pub credentials: Arc<dyn ResourceStore<Credential>>,
}

impl Stores {
    pub fn memory() -> Self {
        Self {
            projects: Arc::new(MemoryStore::new()),
            pipelines: Arc::new(MemoryStore::new()),
            credentials: Arc::new(MemoryStore::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            projects: Arc::new(PgStore::new(pool.clone())),
            pipelines: Arc::new(PgStore::new(pool.clone())),
            credentials: Arc::new(PgStore::new(pool)),
        }
    }
}

pub struct ResourceOperator {
    stores: Stores,
    engine: Arc<dyn RemoteEngine>,
    masker: Arc<dyn SecretMasker>,
    notifier: Arc<dyn SyncNotifier>,
    fanout_concurrency: usize,
    agent_labels: Vec<String>,
}

impl ResourceOperator {
    pub fn new(stores: Stores, engine: Arc<dyn RemoteEngine>) -> Self {
        Self {
            stores,
            engine,
            masker: Arc::new(DefaultSecretMasker::default()),
            notifier: Arc::new(TracingNotifier),
            fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
            agent_labels: Vec::new(),
        }
    }

    pub fn with_masker(mut self, masker: Arc<dyn SecretMasker>) -> Self {
        self.masker = masker;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn SyncNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Zero is treated as one
    pub fn with_fanout_concurrency(mut self, limit: usize) -> Self {
        self.fanout_concurrency = limit.max(1);
        self
    }

    pub fn with_agent_labels(mut self, labels: Vec<String>) -> Self {
        self.agent_labels = labels;
        self
    }

    /// Labels of the build agents pipelines may run on
    pub fn get_agent_labels(&self) -> &[String] {
        &self.agent_labels
    }

    /// Applies a reconciler outcome to a pending resource
    ///
    /// Only `Pending` resources can complete; anything else is a conflict.
    pub async fn complete_sync(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        outcome: SyncOutcome,
    ) -> Result<SyncState> {
        let state = match kind {
            ResourceKind::Project => {
                complete(self.stores.projects.as_ref(), namespace, name, &outcome).await
            }
            ResourceKind::Pipeline => {
                complete(self.stores.pipelines.as_ref(), namespace, name, &outcome).await
            }
            ResourceKind::Credential => {
                complete(self.stores.credentials.as_ref(), namespace, name, &outcome).await
            }
        }
        .inspect_err(|e| tracing::error!("Failed to complete sync of {} {}: {}", kind, name, e))?;

        tracing::info!("{} {} is now {}", kind, name, state.status);
        Ok(state)
    }

    /// Publishes that `resource` is waiting for the reconciler
    async fn notify<R: Resource>(&self, resource: &R) {
        let meta = resource.meta();
        self.notifier
            .notify(SyncEvent::new(R::KIND, &meta.namespace, &meta.name))
            .await;
    }

    /// Awaits an engine call, logging failures before handing them back
    async fn forward<T>(
        &self,
        operation: &str,
        call: impl Future<Output = conduit_client::Result<T>>,
    ) -> Result<T> {
        call.await.map_err(|e| {
            tracing::error!("{} failed: {}", operation, e);
            OperatorError::Upstream(e)
        })
    }
}

async fn complete<R: Resource>(
    store: &dyn ResourceStore<R>,
    namespace: &str,
    name: &str,
    outcome: &SyncOutcome,
) -> Result<SyncState> {
    let mut resource = store
        .get(namespace, name)
        .await?
        .ok_or_else(|| OperatorError::NotFound(format!("{} {} not found", R::KIND, name)))?;

    let next = if outcome.succeeded {
        SyncStatus::Synced
    } else {
        SyncStatus::Failed
    };
    resource
        .sync_mut()
        .transition(next, outcome.reason.clone())
        .map_err(OperatorError::Conflict)?;

    let updated = store.update(resource).await?;
    Ok(updated.sync().clone())
}

#[cfg(test)]
mod tests {
    use super::fake::FakeEngine;
    use super::*;
    use crate::service::sync::ChannelNotifier;
    use conduit_core::domain::pipeline::Pipeline;

    fn outcome(succeeded: bool) -> SyncOutcome {
        SyncOutcome {
            succeeded,
            reason: (!succeeded).then(|| "engine rejected the job".to_string()),
        }
    }

    #[tokio::test]
    async fn test_complete_sync_moves_pending_resources() {
        let stores = Stores::memory();
        let operator = ResourceOperator::new(stores.clone(), Arc::new(FakeEngine::default()));
        stores
            .pipelines
            .create(Pipeline::new("ns", "build"))
            .await
            .unwrap();

        let state = operator
            .complete_sync(ResourceKind::Pipeline, "ns", "build", outcome(true))
            .await
            .unwrap();
        assert_eq!(state.status, SyncStatus::Synced);

        // A settled resource needs a new local write first
        let err = operator
            .complete_sync(ResourceKind::Pipeline, "ns", "build", outcome(false))
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_complete_sync_unknown_resource() {
        let operator = ResourceOperator::new(Stores::memory(), Arc::new(FakeEngine::default()));
        let err = operator
            .complete_sync(ResourceKind::Credential, "ns", "ghost", outcome(true))
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_writes_publish_sync_events() {
        let (notifier, mut rx) = ChannelNotifier::new(8);
        let operator = ResourceOperator::new(Stores::memory(), Arc::new(FakeEngine::default()))
            .with_notifier(Arc::new(notifier));

        let project = operator
            .create_project("ws", Project::new("demo"))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            SyncEvent::new(ResourceKind::Project, "", project.metadata.name.clone())
        );
    }

    #[test]
    fn test_fanout_concurrency_is_at_least_one() {
        let operator = ResourceOperator::new(Stores::memory(), Arc::new(FakeEngine::default()))
            .with_fanout_concurrency(0);
        assert_eq!(operator.fanout_concurrency, 1);
    }
}
