//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use conduit_core::domain::pipeline::Pipeline;
use conduit_core::dto::pipeline::UpdateJenkinsfile;
use conduit_core::query::ListResult;

use crate::api::error::ApiResult;
use crate::api::{AppState, list_query};

/// POST /projects/{project}/pipelines
pub async fn create_pipeline(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Json(pipeline): Json<Pipeline>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    tracing::info!("Creating pipeline {} in {}", pipeline.metadata.name, project);

    let pipeline = state.operator.create_pipeline(&project, pipeline).await?;
    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /projects/{project}/pipelines
pub async fn list_pipelines(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<ListResult<Pipeline>>> {
    tracing::debug!("Listing pipelines of {}", project);

    let query = list_query(pairs)?;
    let pipelines = state.operator.list_pipelines(&project, &query).await?;
    Ok(Json(pipelines))
}

/// GET /projects/{project}/pipelines/{pipeline}
pub async fn get_pipeline(
    State(state): State<AppState>,
    Path((project, name)): Path<(String, String)>,
) -> ApiResult<Json<Pipeline>> {
    let pipeline = state.operator.get_pipeline(&project, &name).await?;
    Ok(Json(pipeline))
}

/// PUT /projects/{project}/pipelines/{pipeline}
/// Update everything except the Jenkinsfile
pub async fn update_pipeline(
    State(state): State<AppState>,
    Path((project, name)): Path<(String, String)>,
    Json(mut pipeline): Json<Pipeline>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Updating pipeline: {}/{}", project, name);

    pipeline.metadata.name = name;
    let pipeline = state.operator.update_pipeline(&project, pipeline).await?;
    Ok(Json(pipeline))
}

/// PUT /projects/{project}/pipelines/{pipeline}/jenkinsfile
pub async fn update_jenkinsfile(
    State(state): State<AppState>,
    Path((project, name)): Path<(String, String)>,
    Json(req): Json<UpdateJenkinsfile>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Updating Jenkinsfile of {}/{} ({})", project, name, req.mode);

    let pipeline = state
        .operator
        .update_jenkinsfile(&project, &name, req)
        .await?;
    Ok(Json(pipeline))
}

/// DELETE /projects/{project}/pipelines/{pipeline}
pub async fn delete_pipeline(
    State(state): State<AppState>,
    Path((project, name)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline: {}/{}", project, name);

    state.operator.delete_pipeline(&project, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}
