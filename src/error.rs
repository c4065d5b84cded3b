use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::aggregation::AggregationError;
use crate::services::nutrition_parser::ParserError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Could not understand the food description. Please try rephrasing.")]
    Parse,

    #[error("Rate limit exceeded. Please try again in a moment.")]
    UpstreamRateLimited,

    #[error("AI usage quota exhausted. Please try again later.")]
    Quota,

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Unexpected response from the AI service (status {0})")]
    Upstream(u16),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ParserError> for AppError {
    fn from(e: ParserError) -> Self {
        match e {
            ParserError::Malformed => AppError::Parse,
            ParserError::RateLimited => AppError::UpstreamRateLimited,
            ParserError::QuotaExceeded => AppError::Quota,
            ParserError::ServiceUnavailable { .. } | ParserError::NotConfigured => {
                AppError::ServiceUnavailable(e.to_string())
            }
            ParserError::Upstream { status } => AppError::Upstream(status),
            ParserError::Transport(_) => AppError::ServiceUnavailable(e.to_string()),
            ParserError::Cancelled => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}

impl From<AggregationError> for AppError {
    fn from(e: AggregationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimited | AppError::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Parse | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Quota => StatusCode::PAYMENT_REQUIRED,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal server error".into()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                "Internal server error".into()
            }
            AppError::Upstream(code) => {
                tracing::error!(upstream_status = code, "AI service error");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = json!({
            "error": {
                "message": message,
                "code": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_parser_errors_map_to_statuses() {
        assert_eq!(AppError::from(ParserError::Malformed).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::from(ParserError::RateLimited).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::from(ParserError::QuotaExceeded).status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::from(ParserError::ServiceUnavailable { attempts: 3 }).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(ParserError::Upstream { status: 500 }).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_offset_error_is_validation() {
        let err = AppError::from(AggregationError::OffsetOutOfRange { offset: 4, max: 1 });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let (status, body) = body_of(AppError::Validation("calories must be >= 0".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["message"], "calories must be >= 0");
        assert_eq!(body["error"]["code"], 422);
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let (status, body) = body_of(AppError::Internal(anyhow::anyhow!("secret detail"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_unavailable_message_mentions_attempts() {
        let err = AppError::from(ParserError::ServiceUnavailable { attempts: 3 });
        let (_, body) = body_of(err).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("after 3 attempts"));
    }
}
