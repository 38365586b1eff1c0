use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error as StdError;

/// Fixed message carried by [`AppError::Unauthenticated`].
pub const SESSION_NOT_FOUND: &str = "Auth session not found";

/// Short title shown with every failure notification.
const ERROR_TITLE: &str = "Error";

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upload failed: {0}")]
    UploadFailed(#[source] anyhow::Error),

    #[error("Persist failed: {0}")]
    PersistFailed(#[source] anyhow::Error),

    #[error("Object removal failed: {0}")]
    ObjectRemovalFailed(#[source] anyhow::Error),

    #[error("Invalid object reference: {0}")]
    InvalidObjectReference(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn unauthenticated() -> Self {
        AppError::Unauthenticated(SESSION_NOT_FOUND.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UploadFailed(_) | AppError::ObjectRemovalFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::PersistFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidObjectReference(_) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing description for the notification body.
    pub fn description(&self) -> String {
        match self {
            AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::UploadFailed(_) => "Failed to upload video. Please try again.".to_string(),
            AppError::PersistFailed(_) => {
                "Failed to save video changes. Please try again.".to_string()
            }
            AppError::ObjectRemovalFailed(_) | AppError::InvalidObjectReference(_) => {
                "Failed to delete video".to_string()
            }
            AppError::Configuration(_) | AppError::Unexpected(_) => {
                "An unexpected error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = self.description();

        tracing::error!(
            error_type = %self,
            error_message = %error_message,
            status_code = %status,
            "Request error"
        );

        let source: Option<&(dyn StdError + 'static)> = match &self {
            AppError::UploadFailed(e)
            | AppError::PersistFailed(e)
            | AppError::ObjectRemovalFailed(e)
            | AppError::Unexpected(e) => Some(e.as_ref()),
            _ => None,
        };
        if let Some(e) = source {
            let mut source_chain = String::new();
            let mut current_err = e.source();
            while let Some(err) = current_err {
                source_chain.push_str(&format!("\n  Caused by: {}", err));
                current_err = err.source();
            }
            if !source_chain.is_empty() {
                tracing::error!("Error source chain:{}", source_chain);
            }
        }

        let body = Json(json!({
            "title": ERROR_TITLE,
            "message": error_message,
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}
