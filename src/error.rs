//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::dataset::DatasetError;
use crate::inference::ModelError;
use crate::models::FeatureError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(String),

    // Resource errors
    NotFound(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.as_str())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// Only an absent feature is a client error; anything else fails like a model exception.
impl From<FeatureError> for AppError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::Missing(_) => AppError::ValidationError(err.to_string()),
            _ => AppError::InternalError(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::InternalError(err.body_text())
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<DatasetError> for AppError {
    fn from(err: DatasetError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_missing_feature_is_bad_request() {
        let err: AppError = FeatureError::Missing("torque".into()).into();
        match err {
            AppError::ValidationError(msg) => assert_eq!(msg, "Missing feature: torque"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unusable_feature_is_internal() {
        let err: AppError = FeatureError::NotNumeric("torque".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = FeatureError::NotAnObject("Request body".into()).into();
        assert!(matches!(err, AppError::InternalError(_)));
    }

    #[test]
    fn test_model_error_is_internal() {
        let err: AppError = ModelError::FeatureMismatch { expected: 5, found: 4 }.into();
        assert!(matches!(err, AppError::InternalError(_)));
    }
}
