//! Application error type and the standard response envelope.
//!
//! Every handler returns `Result<impl IntoResponse, AppError>`; errors are
//! serialized as `{ "message": … }` with the status codes below. Backend
//! failures are logged and answered with a generic message so store details
//! never leak to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::InvalidStatus;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// The named resource does not exist. Answered with 404.
    #[error("{0} not found")]
    NotFound(String),

    /// The request was malformed: missing field, bad quantity, unknown
    /// status literal. Answered with 400.
    #[error("{0}")]
    BadRequest(String),

    /// Admin-secret mismatch on a gated route. Answered with 401.
    #[error("{0}")]
    Unauthorized(String),

    /// An external dependency could not be reached or is not configured.
    /// Answered with 500 but keeps its human-readable message.
    #[error("{0}")]
    ServiceUnreachable(String),

    /// Anything else; the message is replaced before it reaches the client.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Convert a store failure, naming the resource for the 404 message.
    pub fn from_store(err: StoreError, what: &str) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound(what.to_string()),
            StoreError::Backend(err) => AppError::Other(err),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::from_store(err, "Resource")
    }
}

impl From<InvalidStatus> for AppError {
    fn from(err: InvalidStatus) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Other(err) = &self {
            tracing::error!(error = ?err, "Request failed");
        }

        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ServiceUnreachable(_) | AppError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            AppError::Other(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

/// Standard success envelope used by all handlers.
#[derive(Serialize, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T: Serialize, M: Serialize> IntoResponse for StdResponse<T, M> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn errors_map_to_expected_status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("Product".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::BadRequest("quantity must be positive".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Unauthorized("Admin access required".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::ServiceUnreachable("payment processor".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Other(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_the_resource() {
        assert_eq!(
            AppError::NotFound("Member".into()).to_string(),
            "Member not found"
        );
    }

    #[test]
    fn store_not_found_converts_to_404() {
        let err: AppError = StoreError::NotFound.into();
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }
}
