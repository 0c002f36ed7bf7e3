//! Project operations
//!
//! Projects are cluster scoped and grouped by the workspace label. The
//! display name (`generate_name`) is unique within a workspace; the concrete
//! name is assigned by the store.

use conduit_core::domain::LabelSelector;
use conduit_core::domain::meta::WORKSPACE_LABEL;
use conduit_core::domain::project::Project;
use conduit_core::dto::project::ExistenceCheck;
use conduit_core::query::ListResult;

use super::ResourceOperator;
use crate::service::error::{OperatorError, Result};

/// Projects are stored without a namespace
const CLUSTER_SCOPE: &str = "";

impl ResourceOperator {
    pub async fn create_project(&self, workspace: &str, mut project: Project) -> Result<Project> {
        let generate_name = project.metadata.generate_name.clone();
        if generate_name.trim().is_empty() {
            return Err(OperatorError::Validation(
                "project generateName cannot be empty".to_string(),
            ));
        }

        // Not transactional: concurrent creates with the same name can both pass
        if self
            .find_by_generate_name(workspace, &generate_name)
            .await?
            .is_some()
        {
            return Err(OperatorError::Conflict(format!(
                "project {} already exists in workspace {}",
                generate_name, workspace
            )));
        }

        project.metadata.name.clear();
        project.metadata.namespace.clear();
        project
            .metadata
            .labels
            .insert(WORKSPACE_LABEL.to_string(), workspace.to_string());
        project.sync.mark_pending();

        let created = self
            .stores
            .projects
            .create(project)
            .await
            .inspect_err(|e| tracing::error!("Failed to create project {}: {}", generate_name, e))?;

        tracing::info!(
            "Project created: {} ({}) in workspace {}",
            generate_name,
            created.metadata.name,
            workspace
        );
        self.notify(&created).await;
        Ok(created)
    }

    pub async fn check_project(&self, workspace: &str, generate_name: &str) -> Result<ExistenceCheck> {
        let exist = self
            .find_by_generate_name(workspace, generate_name)
            .await?
            .is_some();
        Ok(ExistenceCheck { exist })
    }

    pub async fn get_project(&self, workspace: &str, name: &str) -> Result<Project> {
        tracing::debug!("Getting project: {}", name);

        self.find_project(name)
            .await?
            .filter(|project| project.workspace() == Some(workspace))
            .ok_or_else(|| project_not_found(workspace, name))
    }

    pub async fn get_project_by_generate_name(
        &self,
        workspace: &str,
        generate_name: &str,
    ) -> Result<Project> {
        self.find_by_generate_name(workspace, generate_name)
            .await?
            .ok_or_else(|| project_not_found(workspace, generate_name))
    }

    pub async fn update_project(&self, workspace: &str, mut project: Project) -> Result<Project> {
        // Must already belong to the workspace
        self.get_project(workspace, &project.metadata.name).await?;

        project.metadata.namespace.clear();
        project
            .metadata
            .labels
            .insert(WORKSPACE_LABEL.to_string(), workspace.to_string());
        project.sync.mark_pending();

        let name = project.metadata.name.clone();
        let updated = self
            .stores
            .projects
            .update(project)
            .await
            .inspect_err(|e| tracing::error!("Failed to update project {}: {}", name, e))?;

        tracing::info!("Project updated: {}", name);
        self.notify(&updated).await;
        Ok(updated)
    }

    /// Deletes immediately; nothing waits for the engine to drop the project
    pub async fn delete_project(&self, workspace: &str, name: &str) -> Result<()> {
        self.get_project(workspace, name).await?;

        let deleted = self
            .stores
            .projects
            .delete(CLUSTER_SCOPE, name)
            .await
            .inspect_err(|e| tracing::error!("Failed to delete project {}: {}", name, e))?;
        if !deleted {
            return Err(project_not_found(workspace, name));
        }

        tracing::info!("Project deleted: {}", name);
        Ok(())
    }

    /// Lists a workspace's projects in creation order
    ///
    /// A negative `limit`, or one running past the end, returns everything
    /// from `offset` on. An `offset` past the end returns an empty page.
    pub async fn list_projects(
        &self,
        workspace: &str,
        limit: i64,
        offset: usize,
    ) -> Result<ListResult<Project>> {
        let projects = self.workspace_projects(workspace).await?;
        let total_items = projects.len();

        if offset >= total_items {
            return Ok(ListResult {
                items: Vec::new(),
                total_items,
            });
        }

        let remaining = total_items - offset;
        let limit = usize::try_from(limit)
            .ok()
            .filter(|limit| *limit <= remaining)
            .unwrap_or(remaining);

        let items = projects.into_iter().skip(offset).take(limit).collect();
        Ok(ListResult { items, total_items })
    }

    pub(super) async fn find_project(&self, name: &str) -> Result<Option<Project>> {
        Ok(self.stores.projects.get(CLUSTER_SCOPE, name).await?)
    }

    /// Namespace owning `project`'s pipelines and credentials
    pub(super) async fn admin_namespace(&self, project: &str) -> Result<String> {
        let project = self
            .find_project(project)
            .await?
            .ok_or_else(|| OperatorError::NotFound(format!("project {} not found", project)))?;
        Ok(project.admin_namespace().to_string())
    }

    async fn workspace_projects(&self, workspace: &str) -> Result<Vec<Project>> {
        let selector = LabelSelector::everything().with(WORKSPACE_LABEL, workspace);
        let projects = self
            .stores
            .projects
            .list(CLUSTER_SCOPE, &selector)
            .await
            .inspect_err(|e| {
                tracing::error!("Failed to list projects of workspace {}: {}", workspace, e)
            })?;
        Ok(projects)
    }

    async fn find_by_generate_name(
        &self,
        workspace: &str,
        generate_name: &str,
    ) -> Result<Option<Project>> {
        Ok(self
            .workspace_projects(workspace)
            .await?
            .into_iter()
            .find(|project| project.metadata.generate_name == generate_name))
    }
}

fn project_not_found(workspace: &str, name: &str) -> OperatorError {
    OperatorError::NotFound(format!(
        "project {} not found in workspace {}",
        name, workspace
    ))
}

#[cfg(test)]
mod tests {
    use super::super::Stores;
    use super::super::fake::FakeEngine;
    use super::*;
    use conduit_core::domain::SyncStatus;
    use std::sync::Arc;

    fn operator() -> ResourceOperator {
        ResourceOperator::new(Stores::memory(), Arc::new(FakeEngine::default()))
    }

    async fn seed(operator: &ResourceOperator, workspace: &str, count: usize) -> Vec<String> {
        let mut names = Vec::new();
        for i in 0..count {
            let project = operator
                .create_project(workspace, Project::new(format!("p{}", i)))
                .await
                .unwrap();
            names.push(project.metadata.name);
        }
        names
    }

    fn names(result: &ListResult<Project>) -> Vec<String> {
        result
            .items
            .iter()
            .map(|p| p.metadata.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_create_assigns_name_and_workspace() {
        let operator = operator();
        let mut project = Project::new("demo");
        project.metadata.name = "caller-chosen".to_string();

        let created = operator.create_project("ws", project).await.unwrap();
        assert_ne!(created.metadata.name, "caller-chosen");
        assert!(created.metadata.name.starts_with("demo"));
        assert_eq!(created.workspace(), Some("ws"));
        assert_eq!(created.sync.status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn test_generate_name_is_unique_per_workspace() {
        let operator = operator();
        operator
            .create_project("ws1", Project::new("demo"))
            .await
            .unwrap();

        let err = operator
            .create_project("ws1", Project::new("demo"))
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::Conflict(_)));

        // Case sensitive, and scoped to the workspace
        assert!(
            operator
                .create_project("ws1", Project::new("Demo"))
                .await
                .is_ok()
        );
        assert!(
            operator
                .create_project("ws2", Project::new("demo"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_empty_generate_name_is_rejected() {
        let err = operator()
            .create_project("ws", Project::new("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::Validation(_)));
    }

    #[tokio::test]
    async fn test_check_and_lookup_by_generate_name() {
        let operator = operator();
        let created = operator
            .create_project("ws", Project::new("demo"))
            .await
            .unwrap();

        assert!(operator.check_project("ws", "demo").await.unwrap().exist);
        assert!(!operator.check_project("ws", "other").await.unwrap().exist);
        assert!(!operator.check_project("ws2", "demo").await.unwrap().exist);

        let found = operator
            .get_project_by_generate_name("ws", "demo")
            .await
            .unwrap();
        assert_eq!(found.metadata.name, created.metadata.name);

        let err = operator
            .get_project_by_generate_name("ws", "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_workspace() {
        let operator = operator();
        let created = operator
            .create_project("ws", Project::new("demo"))
            .await
            .unwrap();

        assert!(
            operator
                .get_project("ws", &created.metadata.name)
                .await
                .is_ok()
        );
        let err = operator
            .get_project("other", &created.metadata.name)
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let operator = operator();
        let mut project = operator
            .create_project("ws", Project::new("demo"))
            .await
            .unwrap();
        project.spec.description = Some("updated".to_string());

        let updated = operator.update_project("ws", project.clone()).await.unwrap();
        assert_eq!(updated.spec.description.as_deref(), Some("updated"));
        assert_eq!(updated.metadata.resource_version, 2);

        // Stale version
        let err = operator.update_project("ws", project).await.unwrap_err();
        assert!(matches!(err, OperatorError::Conflict(_)));

        operator
            .delete_project("ws", &updated.metadata.name)
            .await
            .unwrap();
        let err = operator
            .delete_project("ws", &updated.metadata.name)
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_pagination_edges() {
        let operator = operator();
        let all = seed(&operator, "ws", 4).await;
        seed(&operator, "elsewhere", 2).await;

        // -1 means "everything from offset"
        let page = operator.list_projects("ws", -1, 0).await.unwrap();
        assert_eq!(names(&page), all);
        assert_eq!(page.total_items, 4);

        let page = operator.list_projects("ws", 2, 1).await.unwrap();
        assert_eq!(names(&page), all[1..3].to_vec());

        // Runs past the end: clamped
        let page = operator.list_projects("ws", 10, 3).await.unwrap();
        assert_eq!(names(&page), vec![all[3].clone()]);
        assert_eq!(page.total_items, 4);

        // offset = count - 1
        let page = operator.list_projects("ws", 1, 3).await.unwrap();
        assert_eq!(names(&page), vec![all[3].clone()]);

        // offset >= count: empty, never an error
        let page = operator.list_projects("ws", 2, 4).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 4);
        let page = operator.list_projects("ws", -1, 9).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_list_empty_workspace() {
        let page = operator().list_projects("nobody", -1, 0).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 0);
    }
}
