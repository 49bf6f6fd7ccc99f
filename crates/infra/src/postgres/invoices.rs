use std::collections::BTreeMap;

use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use dentlab_cases::{DentalCase, Material};
use dentlab_core::{InvoiceId, Money};
use dentlab_invoicing::{Invoice, InvoiceSummaryItem};

use super::{map_sqlx_error, require_row};
use crate::error::{RepoResult, RepositoryError};
use crate::repository::InvoiceRepository;

const INVOICE_COLUMNS: &str = "id, dentist_name, from_date, to_date, summary, subtotal, \
    paid_amount, grand_total, cases, created_at";

#[derive(Debug, Clone)]
pub struct PostgresInvoiceRepository {
    pool: PgPool,
}

impl PostgresInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Rebuild a snapshot; stored totals are re-checked on the way out.
fn invoice_from_row(row: &PgRow) -> RepoResult<Invoice> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_invoice", e);

    let Json(summary): Json<BTreeMap<Material, InvoiceSummaryItem>> =
        row.try_get("summary").map_err(decode)?;
    let Json(cases): Json<Vec<DentalCase>> = row.try_get("cases").map_err(decode)?;

    Invoice::restore(
        InvoiceId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        row.try_get("dentist_name").map_err(decode)?,
        row.try_get("from_date").map_err(decode)?,
        row.try_get("to_date").map_err(decode)?,
        summary,
        Money::from_minor(row.try_get("subtotal").map_err(decode)?),
        Money::from_minor(row.try_get("paid_amount").map_err(decode)?),
        Money::from_minor(row.try_get("grand_total").map_err(decode)?),
        cases,
        row.try_get("created_at").map_err(decode)?,
    )
    .map_err(|e| RepositoryError::Backend(format!("stored invoice is inconsistent: {e}")))
}

#[async_trait::async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id_typed()), err)]
    async fn save(&self, invoice: Invoice) -> RepoResult<InvoiceId> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, dentist_name, from_date, to_date, summary,
                subtotal, paid_amount, grand_total, cases, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(invoice.id_typed().as_uuid())
        .bind(invoice.dentist_name())
        .bind(invoice.from_date())
        .bind(invoice.to_date())
        .bind(Json(invoice.summary()))
        .bind(invoice.subtotal().minor())
        .bind(invoice.paid_amount().minor())
        .bind(invoice.grand_total().minor())
        .bind(Json(invoice.cases()))
        .bind(invoice.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_invoice", e))?;
        Ok(invoice.id_typed())
    }

    #[instrument(skip(self), err)]
    async fn get(&self, id: InvoiceId) -> RepoResult<Invoice> {
        let row = sqlx::query(&format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_invoice", e))?
            .ok_or(RepositoryError::NotFound)?;
        invoice_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> RepoResult<Vec<Invoice>> {
        let rows = sqlx::query(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_invoices", e))?;
        rows.iter().map(invoice_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_by_dentist(&self, dentist_name: &str) -> RepoResult<Vec<Invoice>> {
        let rows = sqlx::query(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE dentist_name = $1 ORDER BY created_at DESC"
        ))
        .bind(dentist_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_invoices_by_dentist", e))?;
        rows.iter().map(invoice_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: InvoiceId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_invoice", e))?;
        require_row(result.rows_affected())
    }
}
