//! Run-oriented operations proxied to the remote engine
//!
//! Each call adapts the inbound request and forwards it. A [`PipelineScope`]
//! with a branch addresses the branch variant of the same engine endpoint.

use axum::http::Method;
use conduit_client::{PipelineScope, RawResponse};
use conduit_core::domain::run::{
    Artifact, BranchPipeline, CheckCronResult, CheckScript, Crumb, OrgRepo, PipelineRun,
    RemoteList, RemotePipeline, RunNode, RunStep, ScmOrg, ScmServer, Validates,
};
use conduit_core::dto::scm::{CreateScmServer, normalize_api_url};
use serde_json::{Map, Value};

use super::ResourceOperator;
use crate::service::adapter::{InboundRequest, rewrite_input_body, to_http_parameters};
use crate::service::error::{OperatorError, Result};

impl ResourceOperator {
    pub async fn check_pipeline_name(
        &self,
        project: &str,
        pipeline: &str,
        req: &InboundRequest,
    ) -> Result<Map<String, Value>> {
        let params = to_http_parameters(req);
        self.forward(
            "check pipeline name",
            self.engine.check_pipeline_name(project, pipeline, params),
        )
        .await
    }

    pub async fn get_remote_pipeline(
        &self,
        project: &str,
        pipeline: &str,
        req: &InboundRequest,
    ) -> Result<RemotePipeline> {
        let params = to_http_parameters(req);
        self.forward(
            "get remote pipeline",
            self.engine.get_pipeline(project, pipeline, params),
        )
        .await
    }

    pub async fn search_pipelines(&self, req: &InboundRequest) -> Result<RemoteList<RemotePipeline>> {
        let params = to_http_parameters(req);
        self.forward("search pipelines", self.engine.search_pipelines(params))
            .await
    }

    // =============================================================================
    // Runs
    // =============================================================================

    pub async fn get_pipeline_run(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        req: &InboundRequest,
    ) -> Result<PipelineRun> {
        let params = to_http_parameters(req);
        self.forward(
            "get pipeline run",
            self.engine.get_pipeline_run(scope, run_id, params),
        )
        .await
    }

    pub async fn list_pipeline_runs(
        &self,
        scope: &PipelineScope,
        req: &InboundRequest,
    ) -> Result<RemoteList<PipelineRun>> {
        let params = to_http_parameters(req);
        self.forward(
            "list pipeline runs",
            self.engine.list_pipeline_runs(scope, params),
        )
        .await
    }

    pub async fn stop_pipeline(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        req: &InboundRequest,
    ) -> Result<PipelineRun> {
        let params = to_http_parameters(req).with_method(Method::PUT);
        tracing::info!("Stopping run {} of {}/{}", run_id, scope.project, scope.pipeline);
        self.forward(
            "stop pipeline",
            self.engine.stop_pipeline(scope, run_id, params),
        )
        .await
    }

    pub async fn replay_pipeline(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        req: &InboundRequest,
    ) -> Result<PipelineRun> {
        let params = to_http_parameters(req).with_method(Method::PUT);
        tracing::info!("Replaying run {} of {}/{}", run_id, scope.project, scope.pipeline);
        self.forward(
            "replay pipeline",
            self.engine.replay_pipeline(scope, run_id, params),
        )
        .await
    }

    pub async fn run_pipeline(
        &self,
        scope: &PipelineScope,
        req: &InboundRequest,
    ) -> Result<PipelineRun> {
        let params = to_http_parameters(req);
        tracing::info!("Running {}/{}", scope.project, scope.pipeline);
        self.forward("run pipeline", self.engine.run_pipeline(scope, params))
            .await
    }

    pub async fn get_artifacts(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        req: &InboundRequest,
    ) -> Result<Vec<Artifact>> {
        let params = to_http_parameters(req);
        self.forward(
            "get artifacts",
            self.engine.get_artifacts(scope, run_id, params),
        )
        .await
    }

    pub async fn get_run_log(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        req: &InboundRequest,
    ) -> Result<RawResponse> {
        let params = to_http_parameters(req);
        self.forward("get run log", self.engine.get_run_log(scope, run_id, params))
            .await
    }

    pub async fn get_step_log(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        node_id: &str,
        step_id: &str,
        req: &InboundRequest,
    ) -> Result<RawResponse> {
        let params = to_http_parameters(req);
        self.forward(
            "get step log",
            self.engine
                .get_step_log(scope, run_id, node_id, step_id, params),
        )
        .await
    }

    pub async fn get_node_steps(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        node_id: &str,
        req: &InboundRequest,
    ) -> Result<Vec<RunStep>> {
        let params = to_http_parameters(req);
        self.forward(
            "get node steps",
            self.engine.get_node_steps(scope, run_id, node_id, params),
        )
        .await
    }

    pub async fn get_pipeline_run_nodes(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        req: &InboundRequest,
    ) -> Result<Vec<RunNode>> {
        let params = to_http_parameters(req);
        self.forward(
            "get pipeline run nodes",
            self.engine.get_run_nodes(scope, run_id, params),
        )
        .await
    }

    /// Proceeds or aborts an input step
    pub async fn submit_input_step(
        &self,
        scope: &PipelineScope,
        run_id: &str,
        node_id: &str,
        step_id: &str,
        req: &InboundRequest,
    ) -> Result<Vec<u8>> {
        let body = rewrite_input_body(&req.body)
            .inspect_err(|e| tracing::error!("Rejected input step body: {}", e))?;
        let params = to_http_parameters(req).with_body(body);
        self.forward(
            "submit input step",
            self.engine
                .submit_input_step(scope, run_id, node_id, step_id, params),
        )
        .await
    }

    // =============================================================================
    // Branches
    // =============================================================================

    pub async fn get_branch_pipeline(
        &self,
        scope: &PipelineScope,
        req: &InboundRequest,
    ) -> Result<BranchPipeline> {
        let params = to_http_parameters(req);
        self.forward(
            "get branch pipeline",
            self.engine.get_branch_pipeline(scope, params),
        )
        .await
    }

    pub async fn get_pipeline_branches(
        &self,
        project: &str,
        pipeline: &str,
        req: &InboundRequest,
    ) -> Result<RemoteList<BranchPipeline>> {
        let params = to_http_parameters(req);
        self.forward(
            "get pipeline branches",
            self.engine.get_pipeline_branches(project, pipeline, params),
        )
        .await
    }

    pub async fn scan_branch(
        &self,
        project: &str,
        pipeline: &str,
        req: &InboundRequest,
    ) -> Result<Vec<u8>> {
        let params = to_http_parameters(req);
        tracing::info!("Scanning branches of {}/{}", project, pipeline);
        self.forward(
            "scan branch",
            self.engine.scan_branch(project, pipeline, params),
        )
        .await
    }

    pub async fn get_console_log(
        &self,
        project: &str,
        pipeline: &str,
        req: &InboundRequest,
    ) -> Result<Vec<u8>> {
        let params = to_http_parameters(req);
        self.forward(
            "get console log",
            self.engine.get_console_log(project, pipeline, params),
        )
        .await
    }

    pub async fn get_crumb(&self, req: &InboundRequest) -> Result<Crumb> {
        let params = to_http_parameters(req);
        self.forward("get crumb", self.engine.get_crumb(params)).await
    }

    pub async fn check_script_compile(
        &self,
        project: &str,
        pipeline: &str,
        req: &InboundRequest,
    ) -> Result<CheckScript> {
        let params = to_http_parameters(req);
        self.forward(
            "check script compile",
            self.engine.check_script_compile(project, pipeline, params),
        )
        .await
    }

    pub async fn check_cron(&self, project: &str, req: &InboundRequest) -> Result<CheckCronResult> {
        let params = to_http_parameters(req);
        self.forward("check cron", self.engine.check_cron(project, params))
            .await
    }

    // =============================================================================
    // SCM
    // =============================================================================

    pub async fn get_scm_servers(&self, scm: &str, req: &InboundRequest) -> Result<Vec<ScmServer>> {
        let params = to_http_parameters(req).with_method(Method::GET);
        self.forward("get scm servers", self.engine.get_scm_servers(scm, params))
            .await
    }

    /// Registers an SCM server unless one with the same API URL exists
    pub async fn create_scm_server(&self, scm: &str, req: &InboundRequest) -> Result<ScmServer> {
        let requested: CreateScmServer = serde_json::from_slice(&req.body)
            .map_err(|e| OperatorError::Validation(format!("invalid scm server body: {}", e)))?;

        let lookup = to_http_parameters(req)
            .with_method(Method::GET)
            .with_body(Vec::new());
        let existing = self
            .forward("get scm servers", self.engine.get_scm_servers(scm, lookup))
            .await?;

        if let Some(server) = existing
            .into_iter()
            .find(|server| normalize_api_url(&server.api_url) == requested.normalized_api_url())
        {
            tracing::debug!("SCM server for {} already registered as {}", server.api_url, server.id);
            return Ok(server);
        }

        let params = to_http_parameters(req).with_method(Method::POST);
        let created = self
            .forward("create scm server", self.engine.create_scm_server(scm, params))
            .await?;
        tracing::info!("SCM server registered: {} ({})", created.name, created.api_url);
        Ok(created)
    }

    pub async fn get_scm_orgs(&self, scm: &str, req: &InboundRequest) -> Result<Vec<ScmOrg>> {
        let params = to_http_parameters(req);
        self.forward("get scm organizations", self.engine.get_scm_orgs(scm, params))
            .await
    }

    pub async fn get_org_repos(
        &self,
        scm: &str,
        organization: &str,
        req: &InboundRequest,
    ) -> Result<OrgRepo> {
        let params = to_http_parameters(req);
        self.forward(
            "get organization repositories",
            self.engine.get_org_repos(scm, organization, params),
        )
        .await
    }

    pub async fn validate_scm(&self, scm: &str, req: &InboundRequest) -> Result<Validates> {
        let params = to_http_parameters(req).with_method(Method::PUT);
        self.forward("validate scm", self.engine.validate_scm(scm, params))
            .await
    }
}
