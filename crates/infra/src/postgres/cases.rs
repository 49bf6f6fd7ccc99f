use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;
use uuid::Uuid;

use dentlab_cases::{CaseSource, DentalCase};
use dentlab_core::{CaseId, Money};

use super::{map_sqlx_error, require_row};
use crate::error::{RepoResult, RepositoryError};
use crate::repository::{CaseChange, CaseRepository};

const CASE_COLUMNS: &str = "id, patient_name, dentist_name, tooth_numbers, prosthesis_type, \
    material, shade, created_at, delivery_date, notes, source, patient_number, is_deleted, \
    deletion_requested, unit_price";

#[derive(Debug, Clone)]
pub struct PostgresCaseRepository {
    pool: PgPool,
}

impl PostgresCaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_source(value: Option<String>) -> Option<CaseSource> {
    match value.as_deref() {
        Some("Mobile") => Some(CaseSource::Mobile),
        Some("Desktop") => Some(CaseSource::Desktop),
        _ => None,
    }
}

fn case_from_row(row: &PgRow) -> Result<DentalCase, sqlx::Error> {
    Ok(DentalCase {
        id: CaseId::from_uuid(row.try_get::<Uuid, _>("id")?),
        patient_name: row.try_get("patient_name")?,
        dentist_name: row.try_get("dentist_name")?,
        tooth_numbers: row.try_get("tooth_numbers")?,
        prosthesis_type: row.try_get("prosthesis_type")?,
        material: row.try_get("material")?,
        shade: row.try_get("shade")?,
        created_at: row.try_get("created_at")?,
        delivery_date: row.try_get("delivery_date")?,
        notes: row.try_get("notes")?,
        source: parse_source(row.try_get("source")?),
        patient_number: row.try_get("patient_number")?,
        is_deleted: row.try_get("is_deleted")?,
        deletion_requested: row.try_get("deletion_requested")?,
        unit_price: row
            .try_get::<Option<i64>, _>("unit_price")?
            .map(Money::from_minor),
    })
}

async fn write_case<'e, E>(executor: E, case: &DentalCase) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        UPDATE dental_cases SET
            patient_name = $2,
            dentist_name = $3,
            tooth_numbers = $4,
            prosthesis_type = $5,
            material = $6,
            shade = $7,
            delivery_date = $8,
            notes = $9,
            source = $10,
            patient_number = $11,
            is_deleted = $12,
            deletion_requested = $13,
            unit_price = $14
        WHERE id = $1
        "#,
    )
    .bind(case.id.as_uuid())
    .bind(&case.patient_name)
    .bind(&case.dentist_name)
    .bind(&case.tooth_numbers)
    .bind(&case.prosthesis_type)
    .bind(&case.material)
    .bind(&case.shade)
    .bind(case.delivery_date)
    .bind(&case.notes)
    .bind(case.source.map(CaseSource::as_str))
    .bind(&case.patient_number)
    .bind(case.is_deleted)
    .bind(case.deletion_requested)
    .bind(case.unit_price.map(Money::minor))
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

#[async_trait::async_trait]
impl CaseRepository for PostgresCaseRepository {
    #[instrument(skip(self, case), fields(case_id = %case.id), err)]
    async fn insert(&self, case: DentalCase) -> RepoResult<CaseId> {
        sqlx::query(
            r#"
            INSERT INTO dental_cases (
                id, patient_name, dentist_name, tooth_numbers, prosthesis_type,
                material, shade, created_at, delivery_date, notes, source,
                patient_number, is_deleted, deletion_requested, unit_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(case.id.as_uuid())
        .bind(&case.patient_name)
        .bind(&case.dentist_name)
        .bind(&case.tooth_numbers)
        .bind(&case.prosthesis_type)
        .bind(&case.material)
        .bind(&case.shade)
        .bind(case.created_at)
        .bind(case.delivery_date)
        .bind(&case.notes)
        .bind(case.source.map(CaseSource::as_str))
        .bind(&case.patient_number)
        .bind(case.is_deleted)
        .bind(case.deletion_requested)
        .bind(case.unit_price.map(Money::minor))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_case", e))?;
        Ok(case.id)
    }

    #[instrument(skip(self), err)]
    async fn get(&self, id: CaseId) -> RepoResult<DentalCase> {
        let row = sqlx::query(&format!("SELECT {CASE_COLUMNS} FROM dental_cases WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_case", e))?
            .ok_or(RepositoryError::NotFound)?;
        case_from_row(&row).map_err(|e| map_sqlx_error("get_case", e))
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> RepoResult<Vec<DentalCase>> {
        let rows = sqlx::query(&format!(
            "SELECT {CASE_COLUMNS} FROM dental_cases ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_cases", e))?;
        rows.iter()
            .map(case_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_cases", e))
    }

    #[instrument(skip(self), err)]
    async fn list_by_dentist(&self, dentist_name: &str) -> RepoResult<Vec<DentalCase>> {
        let rows = sqlx::query(&format!(
            "SELECT {CASE_COLUMNS} FROM dental_cases WHERE dentist_name = $1 ORDER BY created_at DESC"
        ))
        .bind(dentist_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_cases_by_dentist", e))?;
        rows.iter()
            .map(case_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_cases_by_dentist", e))
    }

    #[instrument(skip(self, change), err)]
    async fn modify(&self, id: CaseId, change: CaseChange) -> RepoResult<DentalCase> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("modify_case", e))?;

        let row = sqlx::query(&format!(
            "SELECT {CASE_COLUMNS} FROM dental_cases WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("modify_case", e))?
        .ok_or(RepositoryError::NotFound)?;

        let mut case = case_from_row(&row).map_err(|e| map_sqlx_error("modify_case", e))?;
        change(&mut case)?;

        let updated = write_case(&mut *tx, &case)
            .await
            .map_err(|e| map_sqlx_error("modify_case", e))?;
        require_row(updated)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("modify_case", e))?;
        Ok(case)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: CaseId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM dental_cases WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_case", e))?;
        require_row(result.rows_affected())
    }
}
