//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific domain.

pub mod credential;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod project;
pub mod run;
pub mod scm;
pub mod sync;

use axum::{
    Router,
    extract::{FromRequest, Request},
    routing::{get, post, put},
};
use conduit_core::query::Query;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::error::{ApiError, ApiResult};
use crate::service::{InboundRequest, ResourceOperator};

/// Largest request body forwarded to the remote engine
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub operator: Arc<ResourceOperator>,
}

impl AppState {
    pub fn new(operator: ResourceOperator) -> Self {
        Self {
            operator: Arc::new(operator),
        }
    }
}

const PIPELINE: &str = "/projects/{project}/pipelines/{pipeline}";
const BRANCH: &str = "/projects/{project}/pipelines/{pipeline}/branches/{branch}";

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Project endpoints
        .route(
            "/workspaces/{workspace}/projects",
            post(project::create_project).get(project::list_projects),
        )
        .route(
            "/workspaces/{workspace}/projects/{name}",
            get(project::get_project)
                .put(project::update_project)
                .delete(project::delete_project),
        )
        .route(
            "/workspaces/{workspace}/checkproject",
            get(project::check_project),
        )
        .route(
            "/workspaces/{workspace}/generatenames/{generate_name}",
            get(project::get_project_by_generate_name),
        )
        // Pipeline endpoints
        .route(
            "/projects/{project}/pipelines",
            post(pipeline::create_pipeline).get(pipeline::list_pipelines),
        )
        .route(
            PIPELINE,
            get(pipeline::get_pipeline)
                .put(pipeline::update_pipeline)
                .delete(pipeline::delete_pipeline),
        )
        .route(
            &format!("{PIPELINE}/jenkinsfile"),
            put(pipeline::update_jenkinsfile),
        )
        // Credential endpoints
        .route(
            "/projects/{project}/credentials",
            post(credential::create_credential).get(credential::list_credentials),
        )
        .route(
            "/projects/{project}/credentials/{credential}",
            get(credential::get_credential)
                .put(credential::update_credential)
                .delete(credential::delete_credential),
        )
        // Reconciler callback
        .route("/sync/{kind}/{name}", post(sync::complete_sync))
        // Remote pipeline endpoints
        .route("/search", get(run::search_pipelines))
        .route(&format!("{PIPELINE}/checkname"), get(run::check_pipeline_name))
        .route(&format!("{PIPELINE}/remote"), get(run::get_remote_pipeline))
        .route(&format!("{PIPELINE}/branches"), get(run::get_pipeline_branches))
        .route(BRANCH, get(run::get_branch_pipeline))
        .route(&format!("{PIPELINE}/scan"), post(run::scan_branch))
        .route(&format!("{PIPELINE}/consolelog"), get(run::get_console_log))
        .route(
            &format!("{PIPELINE}/checkScriptCompile"),
            post(run::check_script_compile),
        )
        .route("/projects/{project}/checkCron", post(run::check_cron))
        .route("/crumbissuer", get(run::get_crumb))
        .route("/agentlabels", get(run::get_agent_labels))
        // SCM endpoints
        .route(
            "/scms/{scm}/servers",
            get(scm::get_scm_servers).post(scm::create_scm_server),
        )
        .route("/scms/{scm}/organizations", get(scm::get_scm_orgs))
        .route(
            "/scms/{scm}/organizations/{organization}/repositories",
            get(scm::get_org_repos),
        )
        .route("/scms/{scm}/verify", post(scm::validate_scm));

    // Runs are served for pipelines and for branches of multi-branch pipelines
    [PIPELINE, BRANCH]
        .into_iter()
        .fold(router, run_routes)
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn run_routes(router: Router<AppState>, prefix: &str) -> Router<AppState> {
    router
        .route(
            &format!("{prefix}/runs"),
            get(run::list_pipeline_runs).post(run::run_pipeline),
        )
        .route(&format!("{prefix}/runs/{{run}}"), get(run::get_pipeline_run))
        .route(&format!("{prefix}/runs/{{run}}/stop"), post(run::stop_pipeline))
        .route(
            &format!("{prefix}/runs/{{run}}/replay"),
            post(run::replay_pipeline),
        )
        .route(
            &format!("{prefix}/runs/{{run}}/artifacts"),
            get(run::get_artifacts),
        )
        .route(&format!("{prefix}/runs/{{run}}/log"), get(run::get_run_log))
        .route(
            &format!("{prefix}/runs/{{run}}/nodes"),
            get(run::get_pipeline_run_nodes),
        )
        .route(
            &format!("{prefix}/runs/{{run}}/nodesdetail"),
            get(run::get_nodes_detail),
        )
        .route(
            &format!("{prefix}/runs/{{run}}/nodes/{{node}}/steps"),
            get(run::get_node_steps),
        )
        .route(
            &format!("{prefix}/runs/{{run}}/nodes/{{node}}/steps/{{step}}"),
            post(run::submit_input_step),
        )
        .route(
            &format!("{prefix}/runs/{{run}}/nodes/{{node}}/steps/{{step}}/log"),
            get(run::get_step_log),
        )
}

/// List query from raw query pairs
fn list_query(pairs: Vec<(String, String)>) -> ApiResult<Query> {
    Query::from_pairs(pairs).map_err(ApiError::BadRequest)
}

impl<S> FromRequest<S> for InboundRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read request body: {}", e)))?;

        Ok(InboundRequest {
            method: parts.method,
            headers: parts.headers,
            uri: parts.uri,
            body: body.to_vec(),
        })
    }
}
