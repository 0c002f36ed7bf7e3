//! Sync API Handler
//!
//! Callback through which the reconciler reports sync outcomes.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use conduit_core::domain::SyncState;
use conduit_core::domain::meta::ResourceKind;
use conduit_core::dto::project::SyncOutcome;
use serde::Deserialize;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct SyncTarget {
    /// Empty for projects
    #[serde(default)]
    pub namespace: String,
}

/// POST /sync/{kind}/{name}?namespace=
pub async fn complete_sync(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
    Query(target): Query<SyncTarget>,
    Json(outcome): Json<SyncOutcome>,
) -> ApiResult<Json<SyncState>> {
    let kind: ResourceKind = kind.parse().map_err(ApiError::BadRequest)?;
    tracing::debug!(
        "Sync outcome for {} {}/{}: succeeded={}",
        kind,
        target.namespace,
        name,
        outcome.succeeded
    );

    let state = state
        .operator
        .complete_sync(kind, &target.namespace, &name, outcome)
        .await?;
    Ok(Json(state))
}
