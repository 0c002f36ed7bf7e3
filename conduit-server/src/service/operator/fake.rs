//! Scriptable [`RemoteEngine`] for operator tests

use async_trait::async_trait;
use conduit_client::{ClientError, HttpParameters, PipelineScope, RawResponse, RemoteEngine, Result};
use conduit_core::domain::run::{
    Artifact, BranchPipeline, CheckCronResult, CheckScript, Crumb, OrgRepo, PipelineRun,
    RemoteList, RemotePipeline, RunNode, RunStep, ScmOrg, ScmServer, Validates,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Call {
    pub operation: &'static str,
    pub params: HttpParameters,
}

#[derive(Default)]
pub struct FakeEngine {
    pub nodes: Vec<RunNode>,
    /// Node ids whose step fetch fails
    pub failing_nodes: Vec<String>,
    /// Per-node delay before the steps come back
    pub step_delays: HashMap<String, Duration>,
    pub scm_servers: Vec<ScmServer>,

    pub(crate) calls: Mutex<Vec<Call>>,
    /// Servers registered through `create_scm_server`, listed after the seeded ones
    pub(crate) created_scm_servers: Mutex<Vec<ScmServer>>,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of step fetches observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, operation: &'static str, params: HttpParameters) {
        self.calls.lock().unwrap().push(Call { operation, params });
    }

    fn run(&self, operation: &'static str, params: HttpParameters) -> Result<PipelineRun> {
        self.record(operation, params);
        Ok(PipelineRun {
            id: "1".to_string(),
            ..Default::default()
        })
    }

    fn unsupported<T>(&self, operation: &'static str, params: HttpParameters) -> Result<T> {
        self.record(operation, params);
        Err(ClientError::api_error(404, format!("{} is not scripted", operation)))
    }
}

/// Steps named after their node, so tests can check placement
pub fn steps_for(node_id: &str) -> Vec<RunStep> {
    vec![RunStep {
        id: format!("{}-step", node_id),
        display_name: Some(format!("steps of {}", node_id)),
        ..Default::default()
    }]
}

#[async_trait]
impl RemoteEngine for FakeEngine {
    async fn check_pipeline_name(
        &self,
        _project: &str,
        _pipeline: &str,
        params: HttpParameters,
    ) -> Result<Map<String, Value>> {
        self.record("check_pipeline_name", params);
        Ok(Map::new())
    }

    async fn get_pipeline(
        &self,
        _project: &str,
        pipeline: &str,
        params: HttpParameters,
    ) -> Result<RemotePipeline> {
        self.record("get_pipeline", params);
        Ok(RemotePipeline {
            name: pipeline.to_string(),
            ..Default::default()
        })
    }

    async fn search_pipelines(&self, params: HttpParameters) -> Result<RemoteList<RemotePipeline>> {
        self.record("search_pipelines", params);
        Ok(Vec::new().into())
    }

    async fn check_script_compile(
        &self,
        _project: &str,
        _pipeline: &str,
        params: HttpParameters,
    ) -> Result<CheckScript> {
        self.unsupported("check_script_compile", params)
    }

    async fn check_cron(&self, _project: &str, params: HttpParameters) -> Result<CheckCronResult> {
        self.unsupported("check_cron", params)
    }

    async fn get_pipeline_run(
        &self,
        _scope: &PipelineScope,
        _run_id: &str,
        params: HttpParameters,
    ) -> Result<PipelineRun> {
        self.run("get_pipeline_run", params)
    }

    async fn list_pipeline_runs(
        &self,
        _scope: &PipelineScope,
        params: HttpParameters,
    ) -> Result<RemoteList<PipelineRun>> {
        self.record("list_pipeline_runs", params);
        Ok(Vec::new().into())
    }

    async fn stop_pipeline(
        &self,
        _scope: &PipelineScope,
        _run_id: &str,
        params: HttpParameters,
    ) -> Result<PipelineRun> {
        self.run("stop_pipeline", params)
    }

    async fn replay_pipeline(
        &self,
        _scope: &PipelineScope,
        _run_id: &str,
        params: HttpParameters,
    ) -> Result<PipelineRun> {
        self.run("replay_pipeline", params)
    }

    async fn run_pipeline(
        &self,
        _scope: &PipelineScope,
        params: HttpParameters,
    ) -> Result<PipelineRun> {
        self.run("run_pipeline", params)
    }

    async fn get_artifacts(
        &self,
        _scope: &PipelineScope,
        _run_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<Artifact>> {
        self.record("get_artifacts", params);
        Ok(Vec::new())
    }

    async fn get_run_log(
        &self,
        _scope: &PipelineScope,
        _run_id: &str,
        params: HttpParameters,
    ) -> Result<RawResponse> {
        self.record("get_run_log", params);
        Ok(RawResponse {
            body: b"Started by user admin\n".to_vec(),
            ..Default::default()
        })
    }

    async fn get_step_log(
        &self,
        _scope: &PipelineScope,
        _run_id: &str,
        _node_id: &str,
        _step_id: &str,
        params: HttpParameters,
    ) -> Result<RawResponse> {
        self.unsupported("get_step_log", params)
    }

    async fn get_run_nodes(
        &self,
        _scope: &PipelineScope,
        _run_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<RunNode>> {
        self.record("get_run_nodes", params);
        Ok(self.nodes.clone())
    }

    async fn get_node_steps(
        &self,
        _scope: &PipelineScope,
        _run_id: &str,
        node_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<RunStep>> {
        self.record("get_node_steps", params);

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.step_delays.get(node_id) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_nodes.iter().any(|id| id == node_id) {
            return Err(ClientError::api_error(500, format!("node {} exploded", node_id)));
        }
        Ok(steps_for(node_id))
    }

    async fn submit_input_step(
        &self,
        _scope: &PipelineScope,
        _run_id: &str,
        _node_id: &str,
        _step_id: &str,
        params: HttpParameters,
    ) -> Result<Vec<u8>> {
        self.record("submit_input_step", params);
        Ok(Vec::new())
    }

    async fn get_branch_pipeline(
        &self,
        scope: &PipelineScope,
        params: HttpParameters,
    ) -> Result<BranchPipeline> {
        self.record("get_branch_pipeline", params);
        Ok(BranchPipeline {
            name: scope.branch.clone().unwrap_or_default(),
            ..Default::default()
        })
    }

    async fn get_pipeline_branches(
        &self,
        _project: &str,
        _pipeline: &str,
        params: HttpParameters,
    ) -> Result<RemoteList<BranchPipeline>> {
        self.record("get_pipeline_branches", params);
        Ok(Vec::new().into())
    }

    async fn scan_branch(
        &self,
        _project: &str,
        _pipeline: &str,
        params: HttpParameters,
    ) -> Result<Vec<u8>> {
        self.record("scan_branch", params);
        Ok(Vec::new())
    }

    async fn get_console_log(
        &self,
        _project: &str,
        _pipeline: &str,
        params: HttpParameters,
    ) -> Result<Vec<u8>> {
        self.unsupported("get_console_log", params)
    }

    async fn get_crumb(&self, params: HttpParameters) -> Result<Crumb> {
        self.unsupported("get_crumb", params)
    }

    async fn get_scm_servers(&self, _scm: &str, params: HttpParameters) -> Result<Vec<ScmServer>> {
        self.record("get_scm_servers", params);
        let mut servers = self.scm_servers.clone();
        servers.extend(self.created_scm_servers.lock().unwrap().iter().cloned());
        Ok(servers)
    }

    async fn create_scm_server(&self, _scm: &str, params: HttpParameters) -> Result<ScmServer> {
        let requested: Value = serde_json::from_slice(&params.body).unwrap_or_default();
        self.record("create_scm_server", params);

        let mut created = self.created_scm_servers.lock().unwrap();
        let server = ScmServer {
            id: format!("created-{}", created.len() + 1),
            name: requested["name"].as_str().unwrap_or_default().to_string(),
            api_url: requested["apiUrl"].as_str().unwrap_or_default().to_string(),
            ..Default::default()
        };
        created.push(server.clone());
        Ok(server)
    }

    async fn get_scm_orgs(&self, _scm: &str, params: HttpParameters) -> Result<Vec<ScmOrg>> {
        self.unsupported("get_scm_orgs", params)
    }

    async fn get_org_repos(
        &self,
        _scm: &str,
        _organization: &str,
        params: HttpParameters,
    ) -> Result<OrgRepo> {
        self.unsupported("get_org_repos", params)
    }

    async fn validate_scm(&self, _scm: &str, params: HttpParameters) -> Result<Validates> {
        self.record("validate_scm", params);
        Ok(Validates::default())
    }
}
