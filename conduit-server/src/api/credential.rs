//! Credential API Handlers
//!
//! HTTP endpoints for credential management. Responses are always masked.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use conduit_core::domain::credential::Credential;
use conduit_core::query::ListResult;

use crate::api::error::ApiResult;
use crate::api::{AppState, list_query};

/// POST /projects/{project}/credentials
pub async fn create_credential(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Json(credential): Json<Credential>,
) -> ApiResult<(StatusCode, Json<Credential>)> {
    tracing::info!(
        "Creating credential {} in {}",
        credential.metadata.name,
        project
    );

    let credential = state.operator.create_credential(&project, credential).await?;
    Ok((StatusCode::CREATED, Json(credential)))
}

/// GET /projects/{project}/credentials
pub async fn list_credentials(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<ListResult<Credential>>> {
    let query = list_query(pairs)?;
    let credentials = state.operator.list_credentials(&project, &query).await?;
    Ok(Json(credentials))
}

/// GET /projects/{project}/credentials/{credential}
pub async fn get_credential(
    State(state): State<AppState>,
    Path((project, name)): Path<(String, String)>,
) -> ApiResult<Json<Credential>> {
    let credential = state.operator.get_credential(&project, &name).await?;
    Ok(Json(credential))
}

/// PUT /projects/{project}/credentials/{credential}
pub async fn update_credential(
    State(state): State<AppState>,
    Path((project, name)): Path<(String, String)>,
    Json(mut credential): Json<Credential>,
) -> ApiResult<Json<Credential>> {
    tracing::info!("Updating credential: {}/{}", project, name);

    credential.metadata.name = name;
    let credential = state.operator.update_credential(&project, credential).await?;
    Ok(Json(credential))
}

/// DELETE /projects/{project}/credentials/{credential}
pub async fn delete_credential(
    State(state): State<AppState>,
    Path((project, name)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting credential: {}/{}", project, name);

    state.operator.delete_credential(&project, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}
