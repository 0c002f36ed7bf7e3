//! SCM API Handlers
//!
//! Source-control servers, organizations and repositories, proxied to the
//! remote engine.

use axum::{
    Json,
    extract::{Path, State},
};
use conduit_core::domain::run::{OrgRepo, ScmOrg, ScmServer, Validates};

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::InboundRequest;

/// GET /scms/{scm}/servers
pub async fn get_scm_servers(
    State(state): State<AppState>,
    Path(scm): Path<String>,
    req: InboundRequest,
) -> ApiResult<Json<Vec<ScmServer>>> {
    let servers = state.operator.get_scm_servers(&scm, &req).await?;
    Ok(Json(servers))
}

/// POST /scms/{scm}/servers
/// Returns the existing server when one with the same API URL is registered
pub async fn create_scm_server(
    State(state): State<AppState>,
    Path(scm): Path<String>,
    req: InboundRequest,
) -> ApiResult<Json<ScmServer>> {
    tracing::info!("Registering {} server", scm);

    let server = state.operator.create_scm_server(&scm, &req).await?;
    Ok(Json(server))
}

/// GET /scms/{scm}/organizations
pub async fn get_scm_orgs(
    State(state): State<AppState>,
    Path(scm): Path<String>,
    req: InboundRequest,
) -> ApiResult<Json<Vec<ScmOrg>>> {
    let orgs = state.operator.get_scm_orgs(&scm, &req).await?;
    Ok(Json(orgs))
}

/// GET /scms/{scm}/organizations/{organization}/repositories
pub async fn get_org_repos(
    State(state): State<AppState>,
    Path((scm, organization)): Path<(String, String)>,
    req: InboundRequest,
) -> ApiResult<Json<OrgRepo>> {
    let repos = state
        .operator
        .get_org_repos(&scm, &organization, &req)
        .await?;
    Ok(Json(repos))
}

/// POST /scms/{scm}/verify
pub async fn validate_scm(
    State(state): State<AppState>,
    Path(scm): Path<String>,
    req: InboundRequest,
) -> ApiResult<Json<Validates>> {
    let result = state.operator.validate_scm(&scm, &req).await?;
    Ok(Json(result))
}
