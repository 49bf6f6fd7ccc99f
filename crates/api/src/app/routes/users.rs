//! Doctor account management (owner only).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};

use dentlab_auth::{NewUser, Permission, UserPatch};
use dentlab_core::UserId;

use crate::app::errors::ApiError;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", patch(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::USERS_MANAGE)?;
    Ok(Json(services.repos.users.list().await?).into_response())
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewUser>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::USERS_MANAGE)?;

    let user = services.repos.users.add(UserId::new(), body).await?;
    tracing::info!(user_id = %user.id, name = %user.name, "doctor account created");
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<UserPatch>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::USERS_MANAGE)?;

    let user = services.repos.users.update(parse_id(&id)?, body).await?;
    Ok(Json(user).into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::USERS_MANAGE)?;

    let id: UserId = parse_id(&id)?;
    services.repos.users.delete(id).await?;
    tracing::info!(user_id = %id, "doctor account deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
