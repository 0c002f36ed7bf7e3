//! Credential operations
//!
//! Credentials never leave the operator unmasked.

use conduit_core::domain::credential::Credential;
use conduit_core::query::{ListResult, Query, default_list};

use super::ResourceOperator;
use crate::service::error::{OperatorError, Result};

impl ResourceOperator {
    pub async fn create_credential(
        &self,
        project: &str,
        mut credential: Credential,
    ) -> Result<Credential> {
        credential.metadata.namespace = self.admin_namespace(project).await?;
        credential.auto_sync = true;
        credential.sync.mark_pending();

        let created = self
            .stores
            .credentials
            .create(credential)
            .await
            .inspect_err(|e| tracing::error!("Failed to create credential in {}: {}", project, e))?;

        tracing::info!(
            "Credential created: {}/{} ({})",
            created.metadata.namespace,
            created.metadata.name,
            created.credential_type
        );
        self.notify(&created).await;
        Ok(self.masker.mask(&created))
    }

    pub async fn get_credential(&self, project: &str, name: &str) -> Result<Credential> {
        tracing::debug!("Getting credential: {}/{}", project, name);

        let namespace = self.admin_namespace(project).await?;
        let credential = self
            .stores
            .credentials
            .get(&namespace, name)
            .await?
            .ok_or_else(|| credential_not_found(project, name))?;
        Ok(self.masker.mask(&credential))
    }

    pub async fn update_credential(
        &self,
        project: &str,
        mut credential: Credential,
    ) -> Result<Credential> {
        credential.metadata.namespace = self.admin_namespace(project).await?;
        credential.auto_sync = true;
        credential.sync.mark_pending();

        let name = credential.metadata.name.clone();
        let updated = self
            .stores
            .credentials
            .update(credential)
            .await
            .inspect_err(|e| tracing::error!("Failed to update credential {}: {}", name, e))?;

        tracing::info!("Credential updated: {}/{}", updated.metadata.namespace, name);
        self.notify(&updated).await;
        Ok(self.masker.mask(&updated))
    }

    pub async fn delete_credential(&self, project: &str, name: &str) -> Result<()> {
        let namespace = self.admin_namespace(project).await?;
        let deleted = self
            .stores
            .credentials
            .delete(&namespace, name)
            .await
            .inspect_err(|e| tracing::error!("Failed to delete credential {}: {}", name, e))?;
        if !deleted {
            return Err(credential_not_found(project, name));
        }

        tracing::info!("Credential deleted: {}/{}", namespace, name);
        Ok(())
    }

    /// Lists credentials of the supported types only
    pub async fn list_credentials(
        &self,
        project: &str,
        query: &Query,
    ) -> Result<ListResult<Credential>> {
        let namespace = self.admin_namespace(project).await?;
        let credentials: Vec<Credential> = self
            .stores
            .credentials
            .list(&namespace, &query.label_selector)
            .await
            .inspect_err(|e| tracing::error!("Failed to list credentials of {}: {}", project, e))?
            .into_iter()
            .filter(Credential::is_supported_type)
            .collect();

        let mut result = default_list(credentials, query);
        result.items = result
            .items
            .iter()
            .map(|credential| self.masker.mask(credential))
            .collect();
        Ok(result)
    }
}

fn credential_not_found(project: &str, name: &str) -> OperatorError {
    OperatorError::NotFound(format!(
        "credential {} not found in project {}",
        name, project
    ))
}
