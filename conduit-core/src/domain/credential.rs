//! Credential domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::meta::{ObjectMeta, Resource, ResourceKind};
use super::sync::SyncState;

pub const CREDENTIAL_TYPE_BASIC_AUTH: &str = "credential.conduit.io/basic-auth";
pub const CREDENTIAL_TYPE_SSH_AUTH: &str = "credential.conduit.io/ssh-auth";
pub const CREDENTIAL_TYPE_SECRET_TEXT: &str = "credential.conduit.io/secret-text";
pub const CREDENTIAL_TYPE_KUBECONFIG: &str = "credential.conduit.io/kubeconfig";

/// Secret types exposed through the credential API
///
/// Secrets of any other type may share the namespace but are never listed.
pub const SUPPORTED_CREDENTIAL_TYPES: [&str; 4] = [
    CREDENTIAL_TYPE_BASIC_AUTH,
    CREDENTIAL_TYPE_SSH_AUTH,
    CREDENTIAL_TYPE_SECRET_TEXT,
    CREDENTIAL_TYPE_KUBECONFIG,
];

/// Namespaced secret scoped to a project's admin namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub metadata: ObjectMeta,

    #[serde(rename = "type")]
    pub credential_type: String,

    #[serde(default)]
    pub data: BTreeMap<String, String>,

    /// Whether the reconciler pushes this credential to the remote engine
    #[serde(default)]
    pub auto_sync: bool,

    #[serde(default)]
    pub sync: SyncState,
}

impl Credential {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        credential_type: impl Into<String>,
    ) -> Self {
        Self {
            metadata: ObjectMeta::named(namespace, name),
            credential_type: credential_type.into(),
            data: BTreeMap::new(),
            auto_sync: true,
            sync: SyncState::pending(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn is_supported_type(&self) -> bool {
        SUPPORTED_CREDENTIAL_TYPES.contains(&self.credential_type.as_str())
    }
}

impl Resource for Credential {
    const KIND: ResourceKind = ResourceKind::Credential;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn sync(&self) -> &SyncState {
        &self.sync
    }

    fn sync_mut(&mut self) -> &mut SyncState {
        &mut self.sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_types() {
        assert!(Credential::new("ns", "a", CREDENTIAL_TYPE_SSH_AUTH).is_supported_type());
        assert!(!Credential::new("ns", "b", "Opaque").is_supported_type());
    }
}
