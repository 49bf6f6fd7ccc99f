use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use dentlab_auth::Permission;
use dentlab_core::{DomainError, NotificationId};

use crate::app::errors::ApiError;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_unread))
        .route("/:id/read", post(mark_read))
}

/// Unread messages in the caller's inbox, newest first.
pub async fn list_unread(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::NOTIFICATIONS_OWN)?;

    let unread = services
        .repos
        .notifications
        .unread_for(principal.principal().inbox())
        .await?;
    Ok(Json(unread).into_response())
}

pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::NOTIFICATIONS_OWN)?;
    let id: NotificationId = parse_id(&id)?;

    // Someone else's notification looks the same as a missing one.
    let notification = services.repos.notifications.get(id).await?;
    if notification.recipient != principal.principal().inbox() {
        return Err(DomainError::not_found().into());
    }

    services.repos.notifications.mark_read(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
