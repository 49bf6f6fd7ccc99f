use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use dentlab_auth::Permission;
use dentlab_core::InvoiceId;
use dentlab_invoicing::{Invoice, InvoiceDraft, compute_invoice};

use crate::app::dto::{DentistQuery, InvoicePreviewResponse, InvoiceRequestBody};
use crate::app::errors::ApiError;
use crate::app::routes::common::{dentist_scope, parse_id};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(issue_invoice).get(list_invoices))
        .route("/preview", post(preview_invoice))
        .route("/:id", get(get_invoice).delete(delete_invoice))
}

/// Aggregate the dentist's stored cases for the requested period.
async fn compute_draft(
    services: &AppServices,
    principal: &PrincipalContext,
    body: InvoiceRequestBody,
) -> Result<(InvoiceDraft, Vec<String>), ApiError> {
    let (request, ignored_prices) = body.into_request()?;
    principal.ensure_can_access_dentist(&request.dentist_name)?;

    let cases = services
        .repos
        .cases
        .list_by_dentist(&request.dentist_name)
        .await?;
    let draft = compute_invoice(&cases, &request, &services.calendar)?
        .ok_or_else(|| ApiError::NoCasesInRange(request.dentist_name.clone()))?;

    Ok((draft, ignored_prices))
}

pub async fn preview_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<InvoiceRequestBody>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::INVOICES_PREVIEW)?;

    let (draft, ignored_prices) = compute_draft(&services, &principal, body).await?;
    Ok(Json(InvoicePreviewResponse {
        draft,
        ignored_prices,
    })
    .into_response())
}

/// Freeze the computed invoice as a stored snapshot.
pub async fn issue_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<InvoiceRequestBody>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::INVOICES_ISSUE)?;

    let (draft, ignored_prices) = compute_draft(&services, &principal, body).await?;
    if !ignored_prices.is_empty() {
        tracing::debug!(?ignored_prices, "invoice issued with standard prices for ignored entries");
    }

    let invoice = Invoice::issue(InvoiceId::new(), draft, Utc::now());
    services.repos.invoices.save(invoice.clone()).await?;
    tracing::info!(
        invoice_id = %invoice.id_typed(),
        dentist = %invoice.dentist_name(),
        grand_total = invoice.grand_total().minor(),
        "invoice issued"
    );

    Ok((StatusCode::CREATED, Json(invoice)).into_response())
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<DentistQuery>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::INVOICES_READ_OWN)?;

    let invoices = match dentist_scope(&principal, query.dentist.as_deref())? {
        Some(dentist) => services.repos.invoices.list_by_dentist(&dentist).await?,
        None => services.repos.invoices.list().await?,
    };
    Ok(Json(invoices).into_response())
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::INVOICES_READ_OWN)?;

    let invoice = services.repos.invoices.get(parse_id(&id)?).await?;
    principal.ensure_can_access_dentist(invoice.dentist_name())?;
    Ok(Json(invoice).into_response())
}

pub async fn delete_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    principal.require(&Permission::INVOICES_DELETE)?;

    let id: InvoiceId = parse_id(&id)?;
    services.repos.invoices.delete(id).await?;
    tracing::info!(invoice_id = %id, "invoice deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
