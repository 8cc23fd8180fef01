//! API error taxonomy and response envelopes.
//!
//! Every failure a handler can produce maps to one of five conditions.
//! Error bodies are always `{"message":"error","errors":[...]}`; success
//! bodies always carry `"message":"success"`. Dependency failures are
//! logged with their cause and surfaced as a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mediflow_validation::ValidationResult;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed fields; carries the full list of reasons.
    #[error("validation failed")]
    Validation(Vec<String>),
    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The request contradicts current state (booked slot, duplicate email).
    #[error("{0}")]
    Conflict(String),
    /// Missing, invalid, or expired token, or insufficient role.
    #[error("{0}")]
    Auth(String),
    /// Persistence or mail-delivery failure.
    #[error(transparent)]
    Dependency(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(result: ValidationResult) -> Self {
        Self::Validation(result.messages())
    }

    pub fn invalid(message: &str) -> Self {
        Self::Validation(vec![message.to_string()])
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Dependency(anyhow::Error::new(err).context("database operation failed"))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Dependency(anyhow::Error::new(err).context("password hashing failed"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, errors),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, vec![msg]),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, vec![msg]),
            ApiError::Auth(msg) => (StatusCode::UNAUTHORIZED, vec![msg]),
            ApiError::Dependency(cause) => {
                tracing::error!(error = ?cause, "dependency failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec!["Internal server error".to_string()],
                )
            }
        };
        let body = Json(json!({ "message": "error", "errors": errors }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        let cases = [
            (
                ApiError::Validation(vec!["bad".into()]),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::NotFound("missing".into()),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::Conflict("taken".into()), StatusCode::CONFLICT),
            (ApiError::Auth("no".into()), StatusCode::UNAUTHORIZED),
            (
                ApiError::Dependency(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn dependency_message_is_not_leaked() {
        let err = ApiError::Dependency(anyhow::anyhow!("mongodb://secret@host refused"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
