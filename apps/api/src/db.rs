use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Ensures a CV table exists for every configured collection. The collection
/// set is deployment-specific (CV_COLLECTIONS), so the schema is applied per
/// table at startup instead of through fixed migrations. Collection names are
/// validated at config load; see `config::is_valid_collection_name`.
pub async fn ensure_cv_tables(pool: &PgPool, collections: &[String]) -> Result<()> {
    for table in collections {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id             TEXT PRIMARY KEY,
                user_id        TEXT NOT NULL,
                file_id        TEXT NOT NULL,
                filename       TEXT NOT NULL,
                original_name  TEXT NOT NULL,
                file_path      TEXT NOT NULL,
                content_type   TEXT NOT NULL,
                file_size      BIGINT NOT NULL DEFAULT 0,
                extracted_text TEXT,
                content        TEXT,
                cv_text        TEXT,
                uploaded_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
                last_used      TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#
        );
        sqlx::query(&ddl).execute(pool).await?;
        info!("Ensured CV table '{table}' exists");
    }
    Ok(())
}
