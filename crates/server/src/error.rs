use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{chat_api::ChatApiError, fetch::FetchError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    ChatApi(#[from] ChatApiError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("AI assistant is not configured")]
    AssistantUnavailable,
    #[error("{0}")]
    UpstreamUnavailable(&'static str),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Database(sqlx::Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, "not found".to_string())
            }
            ApiError::Database(e) => {
                tracing::error!(error = %e, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database error".to_string(),
                )
            }
            // The user never learns whether the upstream timed out, was
            // unreachable, or answered with an error status.
            ApiError::Fetch(e) => {
                tracing::warn!(error = %e, "upstream fetch failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Upstream service unavailable. Please try again later.".to_string(),
                )
            }
            ApiError::ChatApi(e) => {
                tracing::error!(error = %e, "chat completion failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error generating response".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, (*msg).to_string()),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::AssistantUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ApiError::UpstreamUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, (*msg).to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_exhaustion_maps_to_503() {
        let err = ApiError::Fetch(FetchError::Exhausted {
            attempts: 3,
            last: Box::new(FetchError::Timeout),
        });
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn total_batch_failure_maps_to_503() {
        let err = ApiError::UpstreamUnavailable("No advice available at the moment.");
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = ApiError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn missing_assistant_maps_to_500() {
        assert_eq!(
            ApiError::AssistantUnavailable.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
