use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use super::routes::SubmitResponse;

/// Failures of the read-only endpoints.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request could not be understood.
    #[error("Malformed request: {0}")]
    BadRequest(String),

    /// Something failed on our side.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::error::Error> for ApiError {
    fn from(err: crate::error::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => {
                error!("{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(SubmitResponse::failure(self.to_string(), None))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let bad = ApiError::BadRequest("nope".to_string()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let internal = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_crate_error() {
        let err: ApiError = crate::error::Error::internal("disk on fire").into();
        assert!(matches!(err, ApiError::Internal(_)));
        assert!(err.to_string().contains("disk on fire"));
    }
}
