//! Pipeline operations
//!
//! Pipelines live in their project's admin namespace. The Jenkinsfile is
//! only changed through [`ResourceOperator::update_jenkinsfile`]; every other
//! update carries the stored Jenkinsfile forward.

use conduit_core::domain::SyncState;
use conduit_core::domain::pipeline::{
    JENKINSFILE_EDIT_MODE_ANNOTATION, JENKINSFILE_VALUE_ANNOTATION, JenkinsfileEditMode, Pipeline,
};
use conduit_core::domain::project::Project;
use conduit_core::dto::pipeline::UpdateJenkinsfile;
use conduit_core::query::{FIELD_TYPE, ListResult, Query, default_list};

use super::ResourceOperator;
use crate::repository::StoreError;
use crate::service::error::{OperatorError, Result};

/// Tries at stamping a project's pipeline sync marker before giving up
const MARKER_ATTEMPTS: usize = 3;

impl ResourceOperator {
    pub async fn create_pipeline(&self, project: &str, mut pipeline: Pipeline) -> Result<Pipeline> {
        let owner = self
            .find_project(project)
            .await?
            .ok_or_else(|| OperatorError::NotFound(format!("project {} not found", project)))?;

        pipeline.metadata.namespace = owner.admin_namespace().to_string();
        pipeline.sync.mark_pending();

        let created = self
            .stores
            .pipelines
            .create(pipeline)
            .await
            .inspect_err(|e| tracing::error!("Failed to create pipeline in {}: {}", project, e))?;

        tracing::info!(
            "Pipeline created: {}/{}",
            created.metadata.namespace,
            created.metadata.name
        );
        self.notify(&created).await;

        // The pipeline exists either way; a lost marker is only logged
        if let Err(e) = self.mark_pipelines_pending(owner).await {
            tracing::error!("Failed to mark project {} for pipeline sync: {}", project, e);
        }
        Ok(created)
    }

    /// Stamps the project's pipeline sync marker, re-reading on version conflicts
    async fn mark_pipelines_pending(&self, mut owner: Project) -> Result<()> {
        let name = owner.metadata.name.clone();
        let mut attempt = 1;
        loop {
            owner.pipeline_sync = Some(SyncState::pending());
            match self.stores.projects.update(owner).await {
                Ok(updated) => {
                    self.notify(&updated).await;
                    return Ok(());
                }
                Err(StoreError::Conflict(_)) if attempt < MARKER_ATTEMPTS => {
                    tracing::debug!("Project {} changed underneath, retrying (attempt {})", name, attempt);
                    attempt += 1;
                    owner = self
                        .find_project(&name)
                        .await?
                        .ok_or_else(|| OperatorError::NotFound(format!("project {} not found", name)))?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn get_pipeline(&self, project: &str, name: &str) -> Result<Pipeline> {
        tracing::debug!("Getting pipeline: {}/{}", project, name);

        let namespace = self.admin_namespace(project).await?;
        self.stored_pipeline(project, &namespace, name).await
    }

    /// Writes everything but the Jenkinsfile
    ///
    /// The stored copy supplies the resource version and both Jenkinsfile
    /// forms, whatever the caller sent.
    pub async fn update_pipeline(&self, project: &str, mut pipeline: Pipeline) -> Result<Pipeline> {
        let namespace = self.admin_namespace(project).await?;
        let latest = self
            .stored_pipeline(project, &namespace, &pipeline.metadata.name)
            .await?;

        pipeline.metadata.namespace = namespace;
        pipeline.metadata.resource_version = latest.metadata.resource_version;
        pipeline.carry_jenkinsfile_from(&latest);
        pipeline.sync.mark_pending();

        self.write_pipeline(pipeline).await
    }

    /// The only operation that changes a pipeline's Jenkinsfile
    pub async fn update_jenkinsfile(
        &self,
        project: &str,
        name: &str,
        req: UpdateJenkinsfile,
    ) -> Result<Pipeline> {
        let mode: JenkinsfileEditMode = req.mode.parse().map_err(OperatorError::Validation)?;

        let namespace = self.admin_namespace(project).await?;
        let mut pipeline = self.stored_pipeline(project, &namespace, name).await?;

        pipeline.metadata.annotations.insert(
            JENKINSFILE_EDIT_MODE_ANNOTATION.to_string(),
            mode.as_str().to_string(),
        );
        match mode {
            JenkinsfileEditMode::Json => {
                pipeline
                    .metadata
                    .annotations
                    .insert(JENKINSFILE_VALUE_ANNOTATION.to_string(), req.jenkinsfile);
            }
            JenkinsfileEditMode::Raw => {
                // Multi-branch pipelines keep their Jenkinsfile in the repository
                if let Some(definition) = pipeline.spec.pipeline.as_mut() {
                    definition.jenkinsfile = req.jenkinsfile;
                }
            }
        }
        pipeline.sync.mark_pending();

        self.write_pipeline(pipeline).await
    }

    pub async fn delete_pipeline(&self, project: &str, name: &str) -> Result<()> {
        let namespace = self.admin_namespace(project).await?;
        let deleted = self
            .stores
            .pipelines
            .delete(&namespace, name)
            .await
            .inspect_err(|e| tracing::error!("Failed to delete pipeline {}: {}", name, e))?;
        if !deleted {
            return Err(pipeline_not_found(project, name));
        }

        tracing::info!("Pipeline deleted: {}/{}", namespace, name);
        Ok(())
    }

    /// Lists a project's pipelines, honouring the `type` filter
    pub async fn list_pipelines(&self, project: &str, query: &Query) -> Result<ListResult<Pipeline>> {
        let namespace = self.admin_namespace(project).await?;
        let pipelines = self
            .stores
            .pipelines
            .list(&namespace, &query.label_selector)
            .await
            .inspect_err(|e| tracing::error!("Failed to list pipelines of {}: {}", project, e))?;

        let pipelines: Vec<Pipeline> = match query.filter(FIELD_TYPE) {
            Some(pipeline_type) => pipelines
                .into_iter()
                .filter(|p| p.spec.pipeline_type.as_str() == pipeline_type)
                .collect(),
            None => pipelines,
        };

        Ok(default_list(pipelines, query))
    }

    async fn stored_pipeline(&self, project: &str, namespace: &str, name: &str) -> Result<Pipeline> {
        self.stores
            .pipelines
            .get(namespace, name)
            .await?
            .ok_or_else(|| pipeline_not_found(project, name))
    }

    async fn write_pipeline(&self, pipeline: Pipeline) -> Result<Pipeline> {
        let name = pipeline.metadata.name.clone();
        let updated = self
            .stores
            .pipelines
            .update(pipeline)
            .await
            .inspect_err(|e| tracing::error!("Failed to update pipeline {}: {}", name, e))?;

        tracing::info!(
            "Pipeline updated: {}/{}",
            updated.metadata.namespace,
            updated.metadata.name
        );
        self.notify(&updated).await;
        Ok(updated)
    }
}

fn pipeline_not_found(project: &str, name: &str) -> OperatorError {
    OperatorError::NotFound(format!(
        "pipeline {} not found in project {}",
        name, project
    ))
}
