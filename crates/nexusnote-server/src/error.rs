use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nexusnote_core::NexusError;
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Missing or invalid x-user-id header")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] NexusError),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Serialization(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(NexusError::FileTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Validation(NexusError::UnsupportedFileType { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Io(e) => {
                tracing::error!("Storage error: {:?}", e);
                "Storage error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                "Invalid JSON".to_string()
            }
            AppError::Validation(e) => e.to_string(),
            AppError::NotFound(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Unauthorized => self.to_string(),
        };

        let mut body = json!({ "error": message });
        if let AppError::Validation(e) = &self {
            body["code"] = json!(e.code());
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_statuses() {
        assert_eq!(
            AppError::from(NexusError::Required { field: "name" }).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(NexusError::FileTooLarge { size: 2, limit: 1 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_error_body_carries_code() {
        let response = AppError::from(NexusError::InvalidColor("red".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INVALID_COLOR");
    }
}
