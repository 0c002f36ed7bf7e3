//! Sync notifications
//!
//! Every local write publishes a [`SyncEvent`] so the reconciler knows
//! which resource to push to the remote engine.

use async_trait::async_trait;
use conduit_core::domain::meta::ResourceKind;
use serde::Serialize;
use tokio::sync::mpsc;

/// Identifies a resource that became `Pending`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl SyncEvent {
    pub fn new(kind: ResourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

#[async_trait]
pub trait SyncNotifier: Send + Sync {
    async fn notify(&self, event: SyncEvent);
}

/// Logs events; used when no reconciler is attached
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl SyncNotifier for TracingNotifier {
    async fn notify(&self, event: SyncEvent) {
        tracing::info!(
            kind = %event.kind,
            namespace = %event.namespace,
            name = %event.name,
            "Resource pending sync"
        );
    }
}

/// Hands events to an in-process reconciler over a channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<SyncEvent>,
}

impl ChannelNotifier {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<SyncEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl SyncNotifier for ChannelNotifier {
    async fn notify(&self, event: SyncEvent) {
        if let Err(e) = self.tx.send(event).await {
            tracing::warn!("Sync event dropped, reconciler is gone: {:?}", e.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_delivers_events() {
        let (notifier, mut rx) = ChannelNotifier::new(4);
        notifier
            .notify(SyncEvent::new(ResourceKind::Pipeline, "ns", "build"))
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event, SyncEvent::new(ResourceKind::Pipeline, "ns", "build"));
    }

    #[tokio::test]
    async fn test_closed_channel_does_not_fail_writes() {
        let (notifier, rx) = ChannelNotifier::new(1);
        drop(rx);
        notifier
            .notify(SyncEvent::new(ResourceKind::Project, "", "demo"))
            .await;
    }
}
