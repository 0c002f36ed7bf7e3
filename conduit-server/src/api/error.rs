//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::OperatorError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// Status and message reported by the remote engine
    Upstream(StatusCode, String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Upstream(status, msg) => (status, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<OperatorError> for ApiError {
    fn from(err: OperatorError) -> Self {
        match err {
            OperatorError::Validation(msg) => ApiError::BadRequest(msg),
            OperatorError::Conflict(msg) => ApiError::Conflict(msg),
            OperatorError::NotFound(msg) => ApiError::NotFound(msg),
            OperatorError::Upstream(err) => {
                // No status means the engine never answered
                let status = err
                    .status()
                    .and_then(|status| StatusCode::from_u16(status).ok())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                ApiError::Upstream(status, err.to_string())
            }
            other @ (OperatorError::Store(_) | OperatorError::Serialization(_)) => {
                ApiError::InternalError(other.to_string())
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_client::ClientError;

    fn status_of(err: OperatorError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_operator_errors_map_to_statuses() {
        assert_eq!(
            status_of(OperatorError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(OperatorError::Conflict("taken".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(OperatorError::NotFound("gone".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_engine_status_is_kept() {
        let err = OperatorError::Upstream(ClientError::api_error(403, "forbidden"));
        assert_eq!(status_of(err), StatusCode::FORBIDDEN);

        let err = OperatorError::Upstream(ClientError::ParseError("eof".into()));
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_serialization_is_internal() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            status_of(OperatorError::Serialization(json_err)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
