use crate::model::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shardlink_service::ServiceError;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    NotFound,
    MethodNotAllowed,
    BadRequest(String),
    Service(ServiceError),
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::InvalidUrl(message) => Self::BadRequest(message),
            other => Self::Service(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "Not Found",
                "The requested resource was not found.".to_string(),
            ),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed",
                "The requested method is not allowed for this resource.".to_string(),
            ),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, "Bad Request", message),
            AppError::Service(err) if err.is_unavailable() => {
                error!(error = %err, "storage unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service Unavailable",
                    "Storage is temporarily unavailable.".to_string(),
                )
            }
            AppError::Service(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "Unexpected error while processing request.".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}
