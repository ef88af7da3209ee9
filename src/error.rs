use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{
    agenda::SessionBookingError, booking::BookingError, check_in::CheckInError,
    password::PasswordError, qr_generator::QrGenerationError,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DatabaseError",
            AppError::Validation(_) => "ValidationError",
            AppError::NotFound(_) => "DoesNotExistError",
            AppError::Unauthorized => "AuthenticationError",
            AppError::Forbidden(_) => "PermissionError",
            AppError::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        let (status, error_message) = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": kind,
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::DatabaseError(e) => AppError::Database(e),
            BookingError::EventNotFound => AppError::NotFound(err.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<SessionBookingError> for AppError {
    fn from(err: SessionBookingError) -> Self {
        match err {
            SessionBookingError::DatabaseError(e) => AppError::Database(e),
            SessionBookingError::SessionNotFound => AppError::NotFound(err.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<CheckInError> for AppError {
    fn from(err: CheckInError) -> Self {
        match err {
            CheckInError::DatabaseError(e) => AppError::Database(e),
        }
    }
}

impl From<QrGenerationError> for AppError {
    fn from(err: QrGenerationError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort(_) => AppError::Validation(err.to_string()),
            PasswordError::SaltGeneration => AppError::Internal(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_maps_to_bad_request() {
        let response = AppError::Validation("Rating must be between 1 and 5".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "ValidationError");
        assert_eq!(body["message"], "Rating must be between 1 and 5");
    }

    #[tokio::test]
    async fn test_database_error_is_not_leaked() {
        let response = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Database error");
    }

    #[test]
    fn test_service_errors_map_to_kinds() {
        let full: AppError = BookingError::FullyBooked.into();
        assert!(matches!(full, AppError::Validation(ref m) if m == "This event is fully booked"));

        let missing: AppError = BookingError::EventNotFound.into();
        assert!(matches!(missing, AppError::NotFound(_)));

        let overlap: AppError = SessionBookingError::Conflict("Keynote".to_string()).into();
        assert_eq!(overlap.into_response().status(), StatusCode::BAD_REQUEST);

        let short: AppError = PasswordError::TooShort(8).into();
        assert!(matches!(short, AppError::Validation(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("Event Managers only".to_string())
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("Event not found".to_string())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
    }
}
