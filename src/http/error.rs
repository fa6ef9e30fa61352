use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Per-request API errors; nothing here is process-fatal.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("validation failed")]
    Validation(BTreeMap<&'static str, Vec<String>>),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("inference service unavailable")]
    Upstream(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Single-field validation error, `{field: [message]}`.
    pub fn field(field: &'static str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field, vec![message.to_string()]);
        ApiError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a BTreeMap<&'static str, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (code, message, errors) = match &self {
            ApiError::BadRequest(m) => ("bad_request", m.clone(), None),
            ApiError::Validation(e) => ("validation_error", "validation failed".to_string(), Some(e)),
            ApiError::Unauthorized(m) => ("unauthorized", m.clone(), None),
            ApiError::NotFound(m) => ("not_found", m.clone(), None),
            ApiError::Upstream(err) => {
                tracing::warn!("upstream inference failure: {err:#}");
                ("upstream_error", "inference service unavailable".to_string(), None)
            }
            // Internal details are logged, never sent to the client.
            ApiError::Internal(err) => {
                tracing::error!("internal error: {err:#}");
                ("internal_error", "internal error".to_string(), None)
            }
        };

        let body = Json(ErrorBody {
            code,
            message,
            errors,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::field("password", "mismatch").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Upstream(anyhow::anyhow!("boom")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn field_error_carries_the_field() {
        let err = ApiError::field("username", "already taken");
        match err {
            ApiError::Validation(map) => {
                assert_eq!(map["username"], vec!["already taken".to_string()]);
            }
            _ => panic!("expected validation error"),
        }
    }
}
