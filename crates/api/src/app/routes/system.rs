use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use dentlab_auth::permissions_for_role;

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    let principal = principal.principal();
    Json(serde_json::json!({
        "name": principal.name,
        "role": principal.role.as_str(),
        "userId": principal.user_id.map(|id| id.to_string()),
        "inbox": principal.inbox(),
        "permissions": permissions_for_role(&principal.role)
            .iter()
            .map(|p| p.as_str().to_string())
            .collect::<Vec<_>>(),
    }))
}
