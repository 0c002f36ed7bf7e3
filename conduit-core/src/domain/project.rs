//! Project domain types

use serde::{Deserialize, Serialize};

use super::meta::{ObjectMeta, Resource, ResourceKind, WORKSPACE_LABEL};
use super::sync::SyncState;

/// Top-level grouping of pipelines and credentials
///
/// `metadata.generate_name` doubles as the display name and is unique within
/// a workspace. The concrete `metadata.name` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ProjectSpec,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(default)]
    pub sync: SyncState,

    /// Pipeline sync marker, stamped whenever a pipeline is created under
    /// this project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_sync: Option<SyncState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    /// Namespace owning the project's pipelines and credentials, assigned by
    /// the reconciler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_namespace: Option<String>,
}

impl Project {
    pub fn new(generate_name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                generate_name: generate_name.into(),
                ..Default::default()
            },
            spec: ProjectSpec::default(),
            status: ProjectStatus::default(),
            sync: SyncState::pending(),
            pipeline_sync: None,
        }
    }

    pub fn workspace(&self) -> Option<&str> {
        self.metadata.label(WORKSPACE_LABEL)
    }

    /// Namespace holding this project's pipelines and credentials
    ///
    /// Until the reconciler assigns one, resources live in the namespace
    /// named after the project itself.
    pub fn admin_namespace(&self) -> &str {
        self.status
            .admin_namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(&self.metadata.name)
    }
}

impl Resource for Project {
    const KIND: ResourceKind = ResourceKind::Project;

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
    fn test_admin_namespace_falls_back_to_name() {
        let mut project = Project::new("demo");
        project.metadata.name = "demo8xk2p".to_string();
        assert_eq!(project.admin_namespace(), "demo8xk2p");

        project.status.admin_namespace = Some(String::new());
        assert_eq!(project.admin_namespace(), "demo8xk2p");

        project.status.admin_namespace = Some("demo-admin".to_string());
        assert_eq!(project.admin_namespace(), "demo-admin");
    }

    #[test]
    fn test_deserialize_minimal_project() {
        let project: Project =
            serde_json::from_str(r#"{"metadata":{"generateName":"demo"}}"#).unwrap();
        assert_eq!(project.metadata.generate_name, "demo");
        assert!(project.metadata.name.is_empty());
        assert!(project.workspace().is_none());
    }
}
