use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::apply::payload::Platform;
use crate::models::application::{
    Application, ApplicationLogRow, ApplicationPatch, ApplicationRow, ApplyLogEntry,
    NewApplication,
};
use crate::store::{ApplicationStore, StoreError, StoreResult};

/// Postgres-backed store. Schema: `migrations/001_applications.sql`, applied by
/// [`crate::db::create_pool`].
#[derive(Clone)]
pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn logs_for(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<ApplyLogEntry>>> {
        let rows = sqlx::query_as::<_, ApplicationLogRow>(
            r#"
            SELECT id, application_id, ts, level, message, meta
            FROM application_logs
            WHERE application_id = ANY($1)
            ORDER BY ts ASC, seq ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<ApplyLogEntry>> = HashMap::new();
        for row in rows {
            let application_id = row.application_id;
            let entry = ApplyLogEntry::try_from(row).map_err(StoreError::Corrupt)?;
            grouped.entry(application_id).or_default().push(entry);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn create(&self, fields: NewApplication) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO applications (id, job_url, platform, company, role, stage, files)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(&fields.job_url)
        .bind(fields.platform.as_str())
        .bind(&fields.company)
        .bind(&fields.role)
        .bind(fields.stage.as_str())
        .bind(Json(&fields.files))
        .execute(&self.pool)
        .await?;

        debug!("Inserted application {id} for {}", fields.job_url);
        Ok(id)
    }

    async fn update(&self, id: Uuid, patch: ApplicationPatch) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE applications SET
                company    = COALESCE($2, company),
                role       = COALESCE($3, role),
                stage      = COALESCE($4, stage),
                files      = COALESCE($5, files),
                applied_at = COALESCE($6, applied_at),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.company)
        .bind(patch.role)
        .bind(patch.stage.map(|s| s.as_str()))
        .bind(patch.files.map(Json))
        .bind(patch.applied_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn add_log(&self, id: Uuid, entry: ApplyLogEntry) -> StoreResult<()> {
        // Append-only: INSERT, never UPDATE
        let result = sqlx::query(
            r#"
            INSERT INTO application_logs (id, application_id, ts, level, message, meta)
            SELECT $1, a.id, $3, $4, $5, $6
            FROM applications a
            WHERE a.id = $2
            "#,
        )
        .bind(entry.id)
        .bind(id)
        .bind(entry.ts)
        .bind(entry.level.as_str())
        .bind(&entry.message)
        .bind(entry.meta.map(Json))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn find_by_job(&self, job_url: &str, platform: Platform) -> StoreResult<Option<Uuid>> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM applications
            WHERE job_url = $1 AND platform = $2
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(job_url)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let logs = self.logs_for(&[id]).await?.remove(&id).unwrap_or_default();
        row.into_application(logs).map(Some).map_err(StoreError::Corrupt)
    }

    async fn list(&self) -> StoreResult<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut logs = self.logs_for(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let entries = logs.remove(&row.id).unwrap_or_default();
                row.into_application(entries).map_err(StoreError::Corrupt)
            })
            .collect()
    }
}
