//! Remote Pipeline API Handlers
//!
//! Run, branch and log endpoints forwarded to the remote engine. Every
//! run route exists twice, once under a pipeline and once under one of
//! its branches; the optional `branch` path segment picks the scope.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
};
use conduit_client::{PipelineScope, RawResponse};
use conduit_core::domain::run::{
    Artifact, BranchPipeline, CheckCronResult, CheckScript, Crumb, NodeDetail, PipelineRun,
    RemoteList, RemotePipeline, RunNode, RunStep,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::InboundRequest;

/// Set on node detail responses when some nodes came back without steps
pub const DEGRADED_NODES_HEADER: &str = "x-conduit-degraded-nodes";

#[derive(Debug, Deserialize)]
pub struct ScopePath {
    pub project: String,
    pub pipeline: String,
    pub branch: Option<String>,
}

impl ScopePath {
    pub fn scope(&self) -> PipelineScope {
        scope_of(&self.project, &self.pipeline, self.branch.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct RunPath {
    pub project: String,
    pub pipeline: String,
    pub branch: Option<String>,
    pub run: String,
}

#[derive(Debug, Deserialize)]
pub struct NodePath {
    pub project: String,
    pub pipeline: String,
    pub branch: Option<String>,
    pub run: String,
    pub node: String,
}

#[derive(Debug, Deserialize)]
pub struct StepPath {
    pub project: String,
    pub pipeline: String,
    pub branch: Option<String>,
    pub run: String,
    pub node: String,
    pub step: String,
}

fn scope_of(project: &str, pipeline: &str, branch: Option<&str>) -> PipelineScope {
    match branch {
        Some(branch) => PipelineScope::branch(project, pipeline, branch),
        None => PipelineScope::pipeline(project, pipeline),
    }
}

impl RunPath {
    pub fn scope(&self) -> PipelineScope {
        scope_of(&self.project, &self.pipeline, self.branch.as_deref())
    }
}

impl NodePath {
    pub fn scope(&self) -> PipelineScope {
        scope_of(&self.project, &self.pipeline, self.branch.as_deref())
    }
}

impl StepPath {
    pub fn scope(&self) -> PipelineScope {
        scope_of(&self.project, &self.pipeline, self.branch.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectPath {
    pub project: String,
}

/// Raw engine payload with the engine's headers, minus hop-by-hop ones
fn raw_response(raw: RawResponse) -> Response {
    let mut headers = raw.headers;
    for name in [
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::CONNECTION,
    ] {
        headers.remove(name);
    }
    (headers, raw.body).into_response()
}

// =============================================================================
// Pipelines and branches
// =============================================================================

/// GET /search
pub async fn search_pipelines(
    State(state): State<AppState>,
    req: InboundRequest,
) -> ApiResult<Json<RemoteList<RemotePipeline>>> {
    let pipelines = state.operator.search_pipelines(&req).await?;
    Ok(Json(pipelines))
}

/// GET /projects/{project}/pipelines/{pipeline}/checkname
pub async fn check_pipeline_name(
    State(state): State<AppState>,
    Path(path): Path<ScopePath>,
    req: InboundRequest,
) -> ApiResult<Json<Map<String, Value>>> {
    let result = state
        .operator
        .check_pipeline_name(&path.project, &path.pipeline, &req)
        .await?;
    Ok(Json(result))
}

/// GET /projects/{project}/pipelines/{pipeline}/remote
pub async fn get_remote_pipeline(
    State(state): State<AppState>,
    Path(path): Path<ScopePath>,
    req: InboundRequest,
) -> ApiResult<Json<RemotePipeline>> {
    let pipeline = state
        .operator
        .get_remote_pipeline(&path.project, &path.pipeline, &req)
        .await?;
    Ok(Json(pipeline))
}

/// GET /projects/{project}/pipelines/{pipeline}/branches
pub async fn get_pipeline_branches(
    State(state): State<AppState>,
    Path(path): Path<ScopePath>,
    req: InboundRequest,
) -> ApiResult<Json<RemoteList<BranchPipeline>>> {
    let branches = state
        .operator
        .get_pipeline_branches(&path.project, &path.pipeline, &req)
        .await?;
    Ok(Json(branches))
}

/// GET /projects/{project}/pipelines/{pipeline}/branches/{branch}
pub async fn get_branch_pipeline(
    State(state): State<AppState>,
    Path(path): Path<ScopePath>,
    req: InboundRequest,
) -> ApiResult<Json<BranchPipeline>> {
    let branch = state
        .operator
        .get_branch_pipeline(&path.scope(), &req)
        .await?;
    Ok(Json(branch))
}

/// POST /projects/{project}/pipelines/{pipeline}/scan
pub async fn scan_branch(
    State(state): State<AppState>,
    Path(path): Path<ScopePath>,
    req: InboundRequest,
) -> ApiResult<Vec<u8>> {
    tracing::info!("Scanning branches of {}/{}", path.project, path.pipeline);

    let body = state
        .operator
        .scan_branch(&path.project, &path.pipeline, &req)
        .await?;
    Ok(body)
}

/// GET /projects/{project}/pipelines/{pipeline}/consolelog
pub async fn get_console_log(
    State(state): State<AppState>,
    Path(path): Path<ScopePath>,
    req: InboundRequest,
) -> ApiResult<Vec<u8>> {
    let body = state
        .operator
        .get_console_log(&path.project, &path.pipeline, &req)
        .await?;
    Ok(body)
}

/// POST /projects/{project}/pipelines/{pipeline}/checkScriptCompile
pub async fn check_script_compile(
    State(state): State<AppState>,
    Path(path): Path<ScopePath>,
    req: InboundRequest,
) -> ApiResult<Json<CheckScript>> {
    let result = state
        .operator
        .check_script_compile(&path.project, &path.pipeline, &req)
        .await?;
    Ok(Json(result))
}

/// POST /projects/{project}/checkCron
pub async fn check_cron(
    State(state): State<AppState>,
    Path(path): Path<ProjectPath>,
    req: InboundRequest,
) -> ApiResult<Json<CheckCronResult>> {
    let result = state.operator.check_cron(&path.project, &req).await?;
    Ok(Json(result))
}

/// GET /crumbissuer
pub async fn get_crumb(
    State(state): State<AppState>,
    req: InboundRequest,
) -> ApiResult<Json<Crumb>> {
    let crumb = state.operator.get_crumb(&req).await?;
    Ok(Json(crumb))
}

/// GET /agentlabels
pub async fn get_agent_labels(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.operator.get_agent_labels().to_vec())
}

// =============================================================================
// Runs
// =============================================================================

/// GET {scope}/runs
pub async fn list_pipeline_runs(
    State(state): State<AppState>,
    Path(path): Path<ScopePath>,
    req: InboundRequest,
) -> ApiResult<Json<RemoteList<PipelineRun>>> {
    let runs = state
        .operator
        .list_pipeline_runs(&path.scope(), &req)
        .await?;
    Ok(Json(runs))
}

/// POST {scope}/runs
pub async fn run_pipeline(
    State(state): State<AppState>,
    Path(path): Path<ScopePath>,
    req: InboundRequest,
) -> ApiResult<Json<PipelineRun>> {
    let run = state.operator.run_pipeline(&path.scope(), &req).await?;
    Ok(Json(run))
}

/// GET {scope}/runs/{run}
pub async fn get_pipeline_run(
    State(state): State<AppState>,
    Path(path): Path<RunPath>,
    req: InboundRequest,
) -> ApiResult<Json<PipelineRun>> {
    let run = state
        .operator
        .get_pipeline_run(&path.scope(), &path.run, &req)
        .await?;
    Ok(Json(run))
}

/// POST {scope}/runs/{run}/stop
pub async fn stop_pipeline(
    State(state): State<AppState>,
    Path(path): Path<RunPath>,
    req: InboundRequest,
) -> ApiResult<Json<PipelineRun>> {
    tracing::info!("Stopping run {} of {}", path.run, path.pipeline);

    let run = state
        .operator
        .stop_pipeline(&path.scope(), &path.run, &req)
        .await?;
    Ok(Json(run))
}

/// POST {scope}/runs/{run}/replay
pub async fn replay_pipeline(
    State(state): State<AppState>,
    Path(path): Path<RunPath>,
    req: InboundRequest,
) -> ApiResult<Json<PipelineRun>> {
    tracing::info!("Replaying run {} of {}", path.run, path.pipeline);

    let run = state
        .operator
        .replay_pipeline(&path.scope(), &path.run, &req)
        .await?;
    Ok(Json(run))
}

/// GET {scope}/runs/{run}/artifacts
pub async fn get_artifacts(
    State(state): State<AppState>,
    Path(path): Path<RunPath>,
    req: InboundRequest,
) -> ApiResult<Json<Vec<Artifact>>> {
    let artifacts = state
        .operator
        .get_artifacts(&path.scope(), &path.run, &req)
        .await?;
    Ok(Json(artifacts))
}

/// GET {scope}/runs/{run}/log
pub async fn get_run_log(
    State(state): State<AppState>,
    Path(path): Path<RunPath>,
    req: InboundRequest,
) -> ApiResult<Response> {
    let log = state
        .operator
        .get_run_log(&path.scope(), &path.run, &req)
        .await?;
    Ok(raw_response(log))
}

/// GET {scope}/runs/{run}/nodes
pub async fn get_pipeline_run_nodes(
    State(state): State<AppState>,
    Path(path): Path<RunPath>,
    req: InboundRequest,
) -> ApiResult<Json<Vec<RunNode>>> {
    let nodes = state
        .operator
        .get_pipeline_run_nodes(&path.scope(), &path.run, &req)
        .await?;
    Ok(Json(nodes))
}

/// GET {scope}/runs/{run}/nodesdetail
/// Nodes with their steps; degraded nodes are counted in a response header
pub async fn get_nodes_detail(
    State(state): State<AppState>,
    Path(path): Path<RunPath>,
    req: InboundRequest,
) -> ApiResult<(HeaderMap, Json<Vec<NodeDetail>>)> {
    let report = state
        .operator
        .get_nodes_detail(&path.scope(), &path.run, &req)
        .await?;

    let mut headers = HeaderMap::new();
    if report.is_degraded() {
        headers.insert(
            HeaderName::from_static(DEGRADED_NODES_HEADER),
            HeaderValue::from(report.warnings.len()),
        );
    }
    Ok((headers, Json(report.nodes)))
}

/// GET {scope}/runs/{run}/nodes/{node}/steps
pub async fn get_node_steps(
    State(state): State<AppState>,
    Path(path): Path<NodePath>,
    req: InboundRequest,
) -> ApiResult<Json<Vec<RunStep>>> {
    let steps = state
        .operator
        .get_node_steps(&path.scope(), &path.run, &path.node, &req)
        .await?;
    Ok(Json(steps))
}

/// POST {scope}/runs/{run}/nodes/{node}/steps/{step}
/// Proceed or abort an input step
pub async fn submit_input_step(
    State(state): State<AppState>,
    Path(path): Path<StepPath>,
    req: InboundRequest,
) -> ApiResult<Vec<u8>> {
    tracing::info!("Submitting input step {} of node {}", path.step, path.node);

    let body = state
        .operator
        .submit_input_step(&path.scope(), &path.run, &path.node, &path.step, &req)
        .await?;
    Ok(body)
}

/// GET {scope}/runs/{run}/nodes/{node}/steps/{step}/log
pub async fn get_step_log(
    State(state): State<AppState>,
    Path(path): Path<StepPath>,
    req: InboundRequest,
) -> ApiResult<Response> {
    let log = state
        .operator
        .get_step_log(&path.scope(), &path.run, &path.node, &path.step, &req)
        .await?;
    Ok(raw_response(log))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_drops_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("999"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("x-text-size", HeaderValue::from_static("42"));
        headers.insert("x-more-data", HeaderValue::from_static("true"));

        let response = raw_response(RawResponse {
            body: b"log line\n".to_vec(),
            headers,
        });

        let headers = response.headers();
        assert_eq!(headers["x-text-size"], "42");
        assert_eq!(headers["x-more-data"], "true");
        assert!(headers.get(header::CONNECTION).is_none());
        assert_ne!(
            headers.get(header::CONTENT_LENGTH).map(|v| v.as_bytes()),
            Some(&b"999"[..])
        );
    }

    #[test]
    fn test_scope_from_path() {
        let path = ScopePath {
            project: "demo".to_string(),
            pipeline: "build".to_string(),
            branch: None,
        };
        assert_eq!(path.scope(), PipelineScope::pipeline("demo", "build"));

        let path = ScopePath {
            branch: Some("main".to_string()),
            ..path
        };
        assert_eq!(path.scope(), PipelineScope::branch("demo", "build", "main"));
    }
}
