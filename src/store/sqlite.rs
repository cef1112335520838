//! SQLite-backed [`AnalysisStore`] implementation.
//!
//! The write path is split into [`create_analysis`] and
//! [`append_components`], both scoped to a caller-owned connection so they
//! can share one transaction. [`SqliteStore::record_analysis`] is the usual
//! entry point and does exactly that.

use async_trait::async_trait;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::error::{AnalyzerError, Result};
use crate::models::{AnalysisRecord, Document, ANALYSIS_TYPE, COMPONENT_KEY};

use super::{AnalysisStore, ReadPolicy};

/// Wraps a [`SqlitePool`]; connections are acquired per operation and
/// returned to the pool on every exit path.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Inserts an analysis run for `document_id`, failing with `NotFound` if the
/// document is absent.
pub async fn create_analysis(conn: &mut SqliteConnection, document_id: i64) -> Result<i64> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM pdfs WHERE id = ?")
        .bind(document_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(AnalyzerError::document_not_found(document_id));
    }

    let analysis_id = sqlx::query(
        "INSERT INTO pdf_analyses (pdf_id, analysis_type, created_at) VALUES (?, ?, ?)",
    )
    .bind(document_id)
    .bind(ANALYSIS_TYPE)
    .bind(chrono::Utc::now().timestamp())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(analysis_id)
}

/// Inserts one `component_name` row per component, preserving order.
pub async fn append_components(
    conn: &mut SqliteConnection,
    analysis_id: i64,
    components: &[String],
) -> Result<()> {
    for component in components {
        sqlx::query(
            "INSERT INTO extracted_data (analysis_id, data_key, data_value) VALUES (?, ?, ?)",
        )
        .bind(analysis_id)
        .bind(COMPONENT_KEY)
        .bind(component)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl AnalysisStore for SqliteStore {
    async fn insert_document(&self, filename: &str) -> Result<Document> {
        let uploaded_at = chrono::Utc::now().timestamp();
        let id = sqlx::query("INSERT INTO pdfs (filename, uploaded_at) VALUES (?, ?)")
            .bind(filename)
            .bind(uploaded_at)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Document {
            id,
            filename: filename.to_string(),
            uploaded_at,
        })
    }

    async fn document(&self, id: i64) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT id, filename, uploaded_at FROM pdfs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Document {
            id: row.get("id"),
            filename: row.get("filename"),
            uploaded_at: row.get("uploaded_at"),
        }))
    }

    async fn remove_document(&self, id: i64) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM pdfs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn record_analysis(&self, document_id: i64, components: &[String]) -> Result<i64> {
        // Dropping `tx` without commit rolls back both inserts.
        let mut tx = self.pool.begin().await?;
        let analysis_id = create_analysis(&mut tx, document_id).await?;
        append_components(&mut tx, analysis_id, components).await?;
        tx.commit().await?;

        tracing::info!(
            document_id,
            analysis_id,
            components = components.len(),
            "analysis recorded"
        );
        Ok(analysis_id)
    }

    async fn get_analysis(
        &self,
        document_id: i64,
        policy: ReadPolicy,
    ) -> Result<AnalysisRecord> {
        let filename: Option<String> = sqlx::query_scalar("SELECT filename FROM pdfs WHERE id = ?")
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?;
        let filename = filename.ok_or_else(|| AnalyzerError::document_not_found(document_id))?;

        let components: Vec<String> = match policy {
            ReadPolicy::Union => {
                sqlx::query_scalar(
                    r#"
                    SELECT ed.data_value
                    FROM extracted_data ed
                    JOIN pdf_analyses pa ON ed.analysis_id = pa.id
                    WHERE pa.pdf_id = ? AND pa.analysis_type = ? AND ed.data_key = ?
                    ORDER BY ed.id ASC
                    "#,
                )
                .bind(document_id)
                .bind(ANALYSIS_TYPE)
                .bind(COMPONENT_KEY)
                .fetch_all(&self.pool)
                .await?
            }
            ReadPolicy::Latest => {
                sqlx::query_scalar(
                    r#"
                    SELECT ed.data_value
                    FROM extracted_data ed
                    WHERE ed.data_key = ?
                      AND ed.analysis_id = (
                          SELECT MAX(id) FROM pdf_analyses
                          WHERE pdf_id = ? AND analysis_type = ?
                      )
                    ORDER BY ed.id ASC
                    "#,
                )
                .bind(COMPONENT_KEY)
                .bind(document_id)
                .bind(ANALYSIS_TYPE)
                .fetch_all(&self.pool)
                .await?
            }
        };

        tracing::debug!(document_id, %policy, found = components.len(), "analysis loaded");

        Ok(AnalysisRecord {
            document_id,
            filename,
            analysis_type: ANALYSIS_TYPE.to_string(),
            components,
        })
    }

    async fn ping(&self) -> Result<String> {
        let version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&self.pool)
            .await?;
        Ok(format!("SQLite {}", version))
    }
}
