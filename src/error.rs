use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed feed data: {0}")]
    Decode(String),
}

impl FeedError {
    /// Message suitable for the dashboard's error banner.
    pub fn user_message(&self) -> String {
        match self {
            FeedError::Database(_) => "Failed to load events from the server".to_string(),
            FeedError::Decode(_) => "Received malformed event data".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or invalid identity")]
    Unauthorized,
    #[error("invalid request: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}
