//! Sync state machine
//!
//! Every locally owned resource records whether its latest local write has
//! been pushed to the remote engine. Local writes always move the resource
//! back to `Pending`; only the reconciler moves it out of `Pending`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync status of a resource relative to the remote engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// A local write has not been pushed yet
    Pending,

    /// The remote engine reflects the latest local write
    Synced,

    /// The reconciler gave up on the latest local write
    Failed,
}

impl SyncStatus {
    /// Whether the reconciler may move a resource from `self` to `next`
    pub fn can_transition_to(&self, next: SyncStatus) -> bool {
        matches!(
            (self, next),
            (_, SyncStatus::Pending) | (SyncStatus::Pending, SyncStatus::Synced | SyncStatus::Failed)
        )
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Pending => write!(f, "Pending"),
            SyncStatus::Synced => write!(f, "Synced"),
            SyncStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Sync status plus the time it was last stamped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub status: SyncStatus,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SyncState {
    pub fn pending() -> Self {
        Self {
            status: SyncStatus::Pending,
            time: Utc::now(),
            reason: None,
        }
    }

    /// Stamps `Pending` with a fresh time
    pub fn mark_pending(&mut self) {
        *self = Self::pending();
    }

    /// Applies a reconciler outcome, refusing transitions the machine forbids
    pub fn transition(&mut self, next: SyncStatus, reason: Option<String>) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "invalid sync transition: {} -> {}",
                self.status, next
            ));
        }
        self.status = next;
        self.time = Utc::now();
        self.reason = reason;
        Ok(())
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_can_complete() {
        assert!(SyncStatus::Pending.can_transition_to(SyncStatus::Synced));
        assert!(SyncStatus::Pending.can_transition_to(SyncStatus::Failed));
    }

    #[test]
    fn test_any_state_can_go_pending() {
        for status in [SyncStatus::Pending, SyncStatus::Synced, SyncStatus::Failed] {
            assert!(status.can_transition_to(SyncStatus::Pending));
        }
    }

    #[test]
    fn test_settled_states_cannot_flip() {
        assert!(!SyncStatus::Synced.can_transition_to(SyncStatus::Failed));
        assert!(!SyncStatus::Failed.can_transition_to(SyncStatus::Synced));
        assert!(!SyncStatus::Synced.can_transition_to(SyncStatus::Synced));
    }

    #[test]
    fn test_transition_records_reason() {
        let mut state = SyncState::pending();
        state
            .transition(SyncStatus::Failed, Some("engine unreachable".to_string()))
            .unwrap();
        assert_eq!(state.status, SyncStatus::Failed);
        assert_eq!(state.reason.as_deref(), Some("engine unreachable"));

        assert!(state.transition(SyncStatus::Synced, None).is_err());
        assert_eq!(state.status, SyncStatus::Failed);

        state.mark_pending();
        assert_eq!(state.status, SyncStatus::Pending);
        assert!(state.reason.is_none());
    }
}
