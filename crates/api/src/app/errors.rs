use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use dentlab_auth::{AuthzError, JwtError};
use dentlab_core::DomainError;
use dentlab_infra::RepositoryError;

/// Failure of one API request, rendered as `{"error", "message"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("invalid name or password")]
    InvalidCredentials,

    #[error("no cases found for {0} in the selected range")]
    NoCasesInRange(String),

    #[error("could not issue session token: {0}")]
    Session(#[from] JwtError),
}

/// Left on a response when the database refused an operation. The
/// `permission_help` middleware turns it into a body with a help link.
#[derive(Debug, Clone)]
pub struct DatabasePermissionDenied(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Repository(err) => repository_error_to_response(err),
            ApiError::Forbidden(err) => json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string()),
            ApiError::InvalidCredentials => json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid name or password",
            ),
            err @ ApiError::NoCasesInRange(_) => json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_cases_in_range",
                err.to_string(),
            ),
            ApiError::Session(err) => {
                tracing::error!(error = %err, "session token encoding failed");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "session_error",
                    "could not issue session token",
                )
            }
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized"),
    }
}

pub fn repository_error_to_response(err: RepositoryError) -> Response {
    match err {
        RepositoryError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        RepositoryError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        RepositoryError::PermissionDenied(msg) => {
            let mut response = json_error(StatusCode::FORBIDDEN, "permission_denied", msg.clone());
            response.extensions_mut().insert(DatabasePermissionDenied(msg));
            response
        }
        RepositoryError::Domain(err) => domain_error_to_response(err),
        RepositoryError::Backend(msg) => {
            tracing::error!(error = %msg, "storage backend failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "storage backend error",
            )
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn json_error_with_help(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    help_url: &str,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "help_url": help_url,
        })),
    )
        .into_response()
}
