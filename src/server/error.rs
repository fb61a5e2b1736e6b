use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::SearchError;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// API错误类型
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn unauthorized() -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: "invalid token".to_string() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        let status = match &err {
            SearchError::InvalidArgument(_)
            | SearchError::DimensionMismatch { .. }
            | SearchError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let e = AppError::from(SearchError::InvalidArgument("k".to_string()));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        let e = AppError::from(SearchError::DimensionMismatch { expected: 3, actual: 2 });
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        let e = AppError::from(SearchError::EmbeddingFailed("x".to_string()));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
