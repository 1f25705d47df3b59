use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Schema for the Postgres application store, embedded from `migrations/`.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Creates a PostgreSQL connection pool and brings the schema up to date.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to apply application store migrations")?;

    info!(
        "PostgreSQL ready ({} migration(s) applied or already present)",
        MIGRATOR.migrations.len()
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_schema_is_embedded() {
        let versions: Vec<i64> = MIGRATOR.migrations.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1]);
        assert!(MIGRATOR.migrations[0].sql.contains("application_logs"));
    }
}
