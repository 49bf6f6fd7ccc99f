use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use dentlab_auth::JwtValidator;
use dentlab_observability::RequestLog;

use crate::app::errors::{DatabasePermissionDenied, json_error, json_error_with_help};
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers()).map_err(unauthenticated)?;

    let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        unauthenticated("invalid or expired session token")
    })?;

    req.extensions_mut()
        .insert(PrincipalContext::new(claims.principal()));

    Ok(next.run(req).await)
}

/// Method, path, status and latency of every request.
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    RequestLog {
        method: method.as_str(),
        path: &path,
        status: response.status().as_u16(),
        latency: started.elapsed(),
    }
    .record();

    response
}

/// Adds the configured remediation link to database permission errors.
pub async fn permission_help(
    State(help_url): State<Arc<str>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    match response.extensions().get::<DatabasePermissionDenied>() {
        Some(DatabasePermissionDenied(message)) => json_error_with_help(
            StatusCode::FORBIDDEN,
            "permission_denied",
            message.clone(),
            &help_url,
        ),
        None => response,
    }
}

fn unauthenticated(reason: &'static str) -> Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthenticated", reason)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing bearer token")?;

    let header = header.to_str().map_err(|_| "malformed authorization header")?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or("authorization header is not a bearer token")?;

    let token = header.trim();
    if token.is_empty() {
        return Err("missing bearer token");
    }

    Ok(token)
}
