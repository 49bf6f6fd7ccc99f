use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use dentlab_auth::{OWNER_INBOX, Permission};
use dentlab_cases::{CaseFilter, DentalCase, NewCase, month_options};
use dentlab_core::{CaseId, DomainError, NotificationId};
use dentlab_notifications::{Notification, OutboundMessage};

use crate::app::dto::{CaseListQuery, CasePatchRequest, DentistQuery};
use crate::app::errors::ApiError;
use crate::app::routes::common::{dentist_scope, parse_id};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_cases).post(create_case))
        .route("/months", get(list_months))
        .route("/:id", get(get_case).patch(update_case).delete(delete_case))
        .route("/:id/deletion-request", post(request_deletion))
        .route("/:id/soft-delete", post(soft_delete_case))
        .route("/:id/restore", post(restore_case))
}

async fn scoped_cases(
    services: &AppServices,
    principal: &PrincipalContext,
    dentist: Option<&str>,
) -> Result<Vec<DentalCase>, ApiError> {
    let cases = match dentist_scope(principal, dentist)? {
        Some(dentist) => services.repos.cases.list_by_dentist(&dentist).await?,
        None => services.repos.cases.list().await?,
    };
    Ok(cases)
}

pub async fn list_cases(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<CaseListQuery>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::CASES_READ_OWN)?;

    let cases = scoped_cases(&services, &principal, query.dentist.as_deref()).await?;
    let cases = query
        .filter(!principal.is_owner())
        .apply(cases, &services.calendar);

    Ok(Json(cases).into_response())
}

/// Months that have cases, for the month picker.
pub async fn list_months(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<DentistQuery>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::CASES_READ_OWN)?;

    let mut cases = scoped_cases(&services, &principal, query.dentist.as_deref()).await?;
    if !principal.is_owner() {
        cases = CaseFilter::doctor().apply(cases, &services.calendar);
    }

    Ok(Json(month_options(&cases, &services.calendar)).into_response())
}

pub async fn create_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(mut body): Json<NewCase>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::CASES_CREATE)?;

    body.dentist_name = body.dentist_name.trim().to_string();
    if !principal.is_owner() && body.dentist_name.is_empty() {
        body.dentist_name = principal.name().to_string();
    }
    principal.ensure_can_access_dentist(&body.dentist_name)?;

    let now = Utc::now();
    let case = DentalCase::create(CaseId::new(), body, now)?;
    services.repos.cases.insert(case.clone()).await?;
    tracing::info!(case_id = %case.id, dentist = %case.dentist_name, "case created");

    let notice = Notification::new_case(NotificationId::new(), OWNER_INBOX, &case.dentist_name, now);
    if let Err(e) = services.repos.notifications.create(notice).await {
        tracing::warn!(error = %e, case_id = %case.id, "failed to store owner notification");
    }
    services.notifier.dispatch(OutboundMessage::for_new_case(&case));

    Ok((StatusCode::CREATED, Json(case)).into_response())
}

pub async fn get_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::CASES_READ_OWN)?;

    let case = services.repos.cases.get(parse_id(&id)?).await?;
    principal.ensure_can_access_dentist(&case.dentist_name)?;
    if !principal.is_owner() && !case.is_visible_to_doctor() {
        return Err(DomainError::not_found().into());
    }

    Ok(Json(case).into_response())
}

pub async fn update_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<CasePatchRequest>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::CASES_EDIT)?;
    let id: CaseId = parse_id(&id)?;

    let patch = body.into_patch();
    if patch.is_empty() {
        return Err(DomainError::validation("nothing to update").into());
    }

    let case = services.repos.cases.update(id, patch).await?;
    Ok(Json(case).into_response())
}

pub async fn delete_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::CASES_DELETE)?;

    let id: CaseId = parse_id(&id)?;
    services.repos.cases.delete(id).await?;
    tracing::info!(case_id = %id, "case deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// A doctor asks the owner to remove one of their cases.
pub async fn request_deletion(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::CASES_REQUEST_DELETION)?;
    let id: CaseId = parse_id(&id)?;

    let caller = principal.principal().clone();
    let case = services
        .repos
        .cases
        .modify(
            id,
            Box::new(move |case: &mut DentalCase| {
                caller
                    .ensure_can_access_dentist(&case.dentist_name)
                    .map_err(|_| DomainError::Unauthorized)?;
                case.request_deletion()
            }),
        )
        .await?;

    let notice = Notification::deletion_requested(
        NotificationId::new(),
        OWNER_INBOX,
        &case.dentist_name,
        &case.patient_name,
        Utc::now(),
    );
    if let Err(e) = services.repos.notifications.create(notice).await {
        tracing::warn!(error = %e, case_id = %case.id, "failed to store owner notification");
    }

    Ok(Json(case).into_response())
}

pub async fn soft_delete_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::CASES_DELETE)?;

    let case = services
        .repos
        .cases
        .modify(parse_id(&id)?, Box::new(|case: &mut DentalCase| case.soft_delete()))
        .await?;
    Ok(Json(case).into_response())
}

pub async fn restore_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::CASES_DELETE)?;

    let case = services
        .repos
        .cases
        .modify(parse_id(&id)?, Box::new(|case: &mut DentalCase| case.restore()))
        .await?;
    Ok(Json(case).into_response())
}
