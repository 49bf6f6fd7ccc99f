//! Sign-in endpoints. Both are public; they hand out session tokens.

use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;

use dentlab_auth::{LoginLog, Principal};
use dentlab_core::DomainError;

use crate::app::dto::{LoginRequest, OwnerLoginRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/owner", post(owner_login))
}

/// Doctor sign-in: case-insensitive name, exact password.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let name = body.name.trim();
    if name.is_empty() || body.password.is_empty() {
        return Err(DomainError::validation("name and password are required").into());
    }

    let user = services
        .repos
        .users
        .verify(name, &body.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let now = Utc::now();
    let principal = Principal::doctor(user.name.clone(), user.id);
    let session = services.issue_session(&principal, Some(user.welcome_message), now)?;

    if let Err(e) = services
        .repos
        .login_logs
        .record(LoginLog::new(&user.name, now))
        .await
    {
        tracing::warn!(error = %e, dentist = %user.name, "failed to record login");
    }
    tracing::info!(dentist = %user.name, "doctor signed in");

    Ok(Json(session).into_response())
}

pub async fn owner_login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<OwnerLoginRequest>,
) -> Result<Response, ApiError> {
    if body.password != services.owner_password {
        return Err(ApiError::InvalidCredentials);
    }

    let session = services.issue_session(&Principal::owner(), None, Utc::now())?;
    tracing::info!("owner signed in");
    Ok(Json(session).into_response())
}
