use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::{Action, Feature, Limit, Tier};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Daily {action} limit reached")]
    QuotaExceeded {
        action: Action,
        limit: Limit,
        suggested_tier: Option<Tier>,
    },

    #[error("Feature '{feature}' requires the {required_tier} tier")]
    FeatureLocked { feature: Feature, required_tier: Tier },

    #[error("Remote write failed: {0}")]
    RemoteWriteFailure(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::RemoteWriteFailure(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::QuotaExceeded {
                action,
                limit,
                suggested_tier,
            } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": self.to_string(),
                    "code": "quota_exceeded",
                    "action": action,
                    "limit": limit,
                    "upgradeRequired": true,
                    "suggestedTier": suggested_tier,
                }),
            ),
            AppError::FeatureLocked {
                feature,
                required_tier,
            } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": self.to_string(),
                    "code": "tier_required",
                    "feature": feature,
                    "requiredTier": required_tier,
                }),
            ),
            AppError::RemoteWriteFailure(msg) => {
                tracing::warn!("Remote write failure: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": "Could not save your action, please try again",
                        "code": "remote_write_failure",
                        "retryable": true,
                    }),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            AppError::Jwt(_) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Invalid token" }),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
