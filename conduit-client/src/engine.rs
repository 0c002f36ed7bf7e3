//! Remote engine operations
//!
//! One method per remote operation. Implementations must report HTTP
//! failures as [`ClientError::ApiError`] so callers can tell a missing run
//! from a broken engine.

use async_trait::async_trait;
use conduit_core::domain::run::{
    Artifact, BranchPipeline, CheckCronResult, CheckScript, Crumb, OrgRepo, PipelineRun,
    RemoteList, RemotePipeline, RunNode, RunStep, ScmOrg, ScmServer, Validates,
};
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};
use crate::params::{HttpParameters, PipelineScope};
use crate::{JenkinsClient, paths};

/// Response body plus the engine's headers, for log endpoints
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

/// Client for the remote CI engine
#[async_trait]
pub trait RemoteEngine: Send + Sync {
    // Pipelines

    async fn check_pipeline_name(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<Map<String, Value>>;

    async fn get_pipeline(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<RemotePipeline>;

    async fn search_pipelines(&self, params: HttpParameters) -> Result<RemoteList<RemotePipeline>>;

    async fn check_script_compile(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<CheckScript>;

    async fn check_cron(&self, project: &str, params: HttpParameters) -> Result<CheckCronResult>;

    // Runs. A scope with a branch addresses the branch's runs.

    async fn get_pipeline_run(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<PipelineRun>;

    async fn list_pipeline_runs(
        &self,
        scope: &PipelineScope,
        params: HttpParameters,
    ) -> Result<RemoteList<PipelineRun>>;

    async fn stop_pipeline(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<PipelineRun>;

    async fn replay_pipeline(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<PipelineRun>;

    async fn run_pipeline(&self, scope: &PipelineScope, params: HttpParameters)
    -> Result<PipelineRun>;

    async fn get_artifacts(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<Artifact>>;

    async fn get_run_log(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<RawResponse>;

    async fn get_step_log(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        node_id: &str,
        step_id: &str,
        params: HttpParameters,
    ) -> Result<RawResponse>;

    async fn get_run_nodes(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<RunNode>>;

    async fn get_node_steps(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        node_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<RunStep>>;

    async fn submit_input_step(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        node_id: &str,
        step_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<u8>>;

    // Branches

    async fn get_branch_pipeline(
        &self,
        scope: &PipelineScope,
        params: HttpParameters,
    ) -> Result<BranchPipeline>;

    async fn get_pipeline_branches(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<RemoteList<BranchPipeline>>;

    async fn scan_branch(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<Vec<u8>>;

    async fn get_console_log(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<Vec<u8>>;

    async fn get_crumb(&self, params: HttpParameters) -> Result<Crumb>;

    // SCM

    async fn get_scm_servers(&self, scm: &str, params: HttpParameters) -> Result<Vec<ScmServer>>;

    async fn create_scm_server(&self, scm: &str, params: HttpParameters) -> Result<ScmServer>;

    async fn get_scm_orgs(&self, scm: &str, params: HttpParameters) -> Result<Vec<ScmOrg>>;

    async fn get_org_repos(
        &self,
        scm: &str,
        organization: &str,
        params: HttpParameters,
    ) -> Result<OrgRepo>;

    async fn validate_scm(&self, scm: &str, params: HttpParameters) -> Result<Validates>;
}

#[async_trait]
impl RemoteEngine for JenkinsClient {
    async fn check_pipeline_name(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<Map<String, Value>> {
        let path = paths::check_pipeline_name(project);
        self.fetch_json_with(&path, &params, &[("value", pipeline)])
            .await
    }

    async fn get_pipeline(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<RemotePipeline> {
        let path = paths::pipeline(&PipelineScope::pipeline(project, pipeline));
        self.fetch_json(&path, &params).await
    }

    async fn search_pipelines(&self, params: HttpParameters) -> Result<RemoteList<RemotePipeline>> {
        let items: Vec<RemotePipeline> = self.fetch_json(&paths::search(), &params).await?;
        Ok(items.into())
    }

    async fn check_script_compile(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<CheckScript> {
        let path = paths::check_script_compile(project, pipeline);
        // The engine answers with a one-element array
        let mut results: Vec<CheckScript> = self.fetch_json(&path, &params).await?;
        if results.is_empty() {
            return Err(ClientError::ParseError(
                "empty script compile result".to_string(),
            ));
        }
        Ok(results.swap_remove(0))
    }

    async fn check_cron(&self, project: &str, params: HttpParameters) -> Result<CheckCronResult> {
        self.fetch_json(&paths::check_cron(project), &params).await
    }

    async fn get_pipeline_run(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<PipelineRun> {
        self.fetch_json(&paths::run(scope, run_id), &params).await
    }

    async fn list_pipeline_runs(
        &self,
        scope: &PipelineScope,
        params: HttpParameters,
    ) -> Result<RemoteList<PipelineRun>> {
        let items: Vec<PipelineRun> = self.fetch_json(&paths::runs(scope), &params).await?;
        Ok(items.into())
    }

    async fn stop_pipeline(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<PipelineRun> {
        self.fetch_json(&paths::stop(scope, run_id), &params).await
    }

    async fn replay_pipeline(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<PipelineRun> {
        self.fetch_json(&paths::replay(scope, run_id), &params).await
    }

    async fn run_pipeline(
        &self,
        scope: &PipelineScope,
        params: HttpParameters,
    ) -> Result<PipelineRun> {
        self.fetch_json(&paths::runs(scope), &params).await
    }

    async fn get_artifacts(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<Artifact>> {
        self.fetch_json(&paths::artifacts(scope, run_id), &params)
            .await
    }

    async fn get_run_log(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<RawResponse> {
        self.fetch_raw(&paths::run_log(scope, run_id), &params).await
    }

    async fn get_step_log(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        node_id: &str,
        step_id: &str,
        params: HttpParameters,
    ) -> Result<RawResponse> {
        let path = paths::step_log(scope, run_id, node_id, step_id);
        self.fetch_raw(&path, &params).await
    }

    async fn get_run_nodes(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<RunNode>> {
        self.fetch_json(&paths::nodes(scope, run_id), &params).await
    }

    async fn get_node_steps(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        node_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<RunStep>> {
        self.fetch_json(&paths::steps(scope, run_id, node_id), &params)
            .await
    }

    async fn submit_input_step(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        node_id: &str,
        step_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<u8>> {
        let path = paths::step(scope, run_id, node_id, step_id);
        self.fetch_bytes(&path, &params).await
    }

    async fn get_branch_pipeline(
        &self,
        scope: &PipelineScope,
        params: HttpParameters,
    ) -> Result<BranchPipeline> {
        self.fetch_json(&paths::pipeline(scope), &params).await
    }

    async fn get_pipeline_branches(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<RemoteList<BranchPipeline>> {
        let items: Vec<BranchPipeline> = self
            .fetch_json(&paths::branches(project, pipeline), &params)
            .await?;
        Ok(items.into())
    }

    async fn scan_branch(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<Vec<u8>> {
        self.fetch_bytes(&paths::scan_branch(project, pipeline), &params)
            .await
    }

    async fn get_console_log(
        &self,
        project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<Vec<u8>> {
        self.fetch_bytes(&paths::console_log(project, pipeline), &params)
            .await
    }

    async fn get_crumb(&self, params: HttpParameters) -> Result<Crumb> {
        self.fetch_json(&paths::crumb(), &params).await
    }

    async fn get_scm_servers(&self, scm: &str, params: HttpParameters) -> Result<Vec<ScmServer>> {
        self.fetch_json(&paths::scm_servers(scm), &params).await
    }

    async fn create_scm_server(&self, scm: &str, params: HttpParameters) -> Result<ScmServer> {
        self.fetch_json(&paths::scm_servers(scm), &params).await
    }

    async fn get_scm_orgs(&self, scm: &str, params: HttpParameters) -> Result<Vec<ScmOrg>> {
        self.fetch_json(&paths::scm_organizations(scm), &params)
            .await
    }

    async fn get_org_repos(
        &self,
        scm: &str,
        organization: &str,
        params: HttpParameters,
    ) -> Result<OrgRepo> {
        self.fetch_json(&paths::scm_repositories(scm, organization), &params)
            .await
    }

    async fn validate_scm(&self, scm: &str, params: HttpParameters) -> Result<Validates> {
        self.fetch_json(&paths::scm_validate(scm), &params).await
    }
}
