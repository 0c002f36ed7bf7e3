//! Project API Handlers
//!
//! HTTP endpoints for project management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use conduit_core::domain::project::Project;
use conduit_core::dto::project::ExistenceCheck;
use conduit_core::query::ListResult;
use serde::Deserialize;

use crate::api::AppState;
use crate::api::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct ListProjectsParams {
    /// `-1` or absent returns every project from `offset` on
    #[serde(default = "all")]
    pub limit: i64,
    #[serde(default)]
    pub offset: usize,
}

fn all() -> i64 {
    -1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckProjectParams {
    pub generate_name: String,
}

/// POST /workspaces/{workspace}/projects
pub async fn create_project(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    Json(project): Json<Project>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    tracing::info!(
        "Creating project {} in workspace {}",
        project.metadata.generate_name,
        workspace
    );

    let project = state.operator.create_project(&workspace, project).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /workspaces/{workspace}/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    Query(params): Query<ListProjectsParams>,
) -> ApiResult<Json<ListResult<Project>>> {
    tracing::debug!("Listing projects of workspace {}", workspace);

    let projects = state
        .operator
        .list_projects(&workspace, params.limit, params.offset)
        .await?;
    Ok(Json(projects))
}

/// GET /workspaces/{workspace}/projects/{name}
pub async fn get_project(
    State(state): State<AppState>,
    Path((workspace, name)): Path<(String, String)>,
) -> ApiResult<Json<Project>> {
    let project = state.operator.get_project(&workspace, &name).await?;
    Ok(Json(project))
}

/// PUT /workspaces/{workspace}/projects/{name}
pub async fn update_project(
    State(state): State<AppState>,
    Path((workspace, name)): Path<(String, String)>,
    Json(mut project): Json<Project>,
) -> ApiResult<Json<Project>> {
    tracing::info!("Updating project: {}", name);

    project.metadata.name = name;
    let project = state.operator.update_project(&workspace, project).await?;
    Ok(Json(project))
}

/// DELETE /workspaces/{workspace}/projects/{name}
pub async fn delete_project(
    State(state): State<AppState>,
    Path((workspace, name)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting project: {}", name);

    state.operator.delete_project(&workspace, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /workspaces/{workspace}/checkproject?generateName=
pub async fn check_project(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    Query(params): Query<CheckProjectParams>,
) -> ApiResult<Json<ExistenceCheck>> {
    let check = state
        .operator
        .check_project(&workspace, &params.generate_name)
        .await?;
    Ok(Json(check))
}

/// GET /workspaces/{workspace}/generatenames/{generate_name}
pub async fn get_project_by_generate_name(
    State(state): State<AppState>,
    Path((workspace, generate_name)): Path<(String, String)>,
) -> ApiResult<Json<Project>> {
    let project = state
        .operator
        .get_project_by_generate_name(&workspace, &generate_name)
        .await?;
    Ok(Json(project))
}
