//! Service error type

use conduit_client::ClientError;
use thiserror::Error;

use crate::repository::StoreError;

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// The remote engine refused the call or could not be reached
    #[error("remote engine error: {0}")]
    Upstream(#[from] ClientError),

    #[error(transparent)]
    Store(StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for OperatorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => OperatorError::NotFound(format!("{} not found", what)),
            StoreError::AlreadyExists(what) => {
                OperatorError::Conflict(format!("{} already exists", what))
            }
            StoreError::Conflict(_) => OperatorError::Conflict(err.to_string()),
            StoreError::MissingName => OperatorError::Validation(err.to_string()),
            other => OperatorError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, OperatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_caller_errors() {
        let err: OperatorError = StoreError::AlreadyExists("pipeline ns/build".into()).into();
        assert!(matches!(err, OperatorError::Conflict(_)));

        let err: OperatorError = StoreError::Conflict("pipeline ns/build".into()).into();
        assert!(matches!(err, OperatorError::Conflict(_)));

        let err: OperatorError = StoreError::NotFound("project demo".into()).into();
        assert_eq!(err.to_string(), "project demo not found");
    }
}
