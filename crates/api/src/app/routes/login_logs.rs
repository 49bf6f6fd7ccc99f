use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use dentlab_auth::Permission;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(recent_logins))
}

/// Doctor sign-ins within the retention window. Older entries are pruned
/// on read.
pub async fn recent_logins(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::LOGIN_LOGS_READ)?;
    Ok(Json(services.repos.login_logs.recent(Utc::now()).await?).into_response())
}
