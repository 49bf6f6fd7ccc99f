//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend, session tokens, notification channels
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        jwt: services.sessions.clone(),
    };
    let help_url = services.permissions_help_url.clone();

    // Protected routes: require a valid session token.
    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    let public = Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth::router())
        .layer(Extension(services));

    Router::new().merge(public).merge(protected).layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(middleware::log_requests))
            .layer(axum::middleware::from_fn_with_state(
                help_url,
                middleware::permission_help,
            )),
    )
}

pub use services::AppServices;
