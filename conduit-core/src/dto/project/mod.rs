//! Project DTOs

use serde::{Deserialize, Serialize};

/// Answer to "does a project with this display name exist in the workspace"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistenceCheck {
    pub exist: bool,
}

/// Request from the reconciler reporting the outcome of a sync attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub succeeded: bool,
    #[serde(default)]
    pub reason: Option<String>,
}
