use axum::{routing::get, Router};

pub mod auth;
pub mod cases;
pub mod common;
pub mod invoices;
pub mod login_logs;
pub mod notifications;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/cases", cases::router())
        .nest("/invoices", invoices::router())
        .nest("/users", users::router())
        .nest("/notifications", notifications::router())
        .nest("/login-logs", login_logs::router())
}
