use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates every table and index. Safe to run repeatedly.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // Uploaded documents
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pdfs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            uploaded_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per analyze invocation
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pdf_analyses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            pdf_id INTEGER NOT NULL,
            analysis_type TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (pdf_id) REFERENCES pdfs(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Key/value rows produced by a run; id doubles as insertion sequence
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS extracted_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            analysis_id INTEGER NOT NULL,
            data_key TEXT NOT NULL,
            data_value TEXT NOT NULL,
            FOREIGN KEY (analysis_id) REFERENCES pdf_analyses(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_pdf_analyses_pdf_id ON pdf_analyses(pdf_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_extracted_data_analysis_id ON extracted_data(analysis_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
