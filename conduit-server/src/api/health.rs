//! Health Check API Handler
//!
//! Liveness probe. Does not touch the store or the remote engine.

use axum::{http::StatusCode, response::IntoResponse};

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
