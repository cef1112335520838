//! CLI entry points for the non-server commands.
//!
//! Each command opens the configured database, runs one [`Pipeline`]
//! operation, prints a human-readable summary to stdout, and closes the pool.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::pipeline::Pipeline;
use crate::store::SqliteStore;

async fn open(config: &Config) -> Result<(SqlitePool, Pipeline)> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let store = Arc::new(SqliteStore::new(pool.clone()));
    Ok((pool, Pipeline::from_config(config, store)))
}

pub async fn run_upload(config: &Config, path: &Path) -> Result<()> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let (pool, pipeline) = open(config).await?;
    let summary = pipeline.upload(filename, &bytes).await;
    pool.close().await;
    let summary = summary?;

    println!("Uploaded {} as PDF ID {}", summary.filename, summary.pdf_id);
    Ok(())
}

pub async fn run_analyze(config: &Config, id: i64) -> Result<()> {
    let (pool, pipeline) = open(config).await?;
    let summary = pipeline.analyze(id).await;
    pool.close().await;
    let summary = summary?;

    println!("Analysis complete for PDF ID {}", id);
    println!("  analysis_id:      {}", summary.analysis_id);
    println!("  components_found: {}", summary.components_found);
    if summary.extraction_degraded {
        println!("  warning:          text extraction failed; results may be incomplete");
    }
    Ok(())
}

pub async fn run_results(config: &Config, id: i64) -> Result<()> {
    let (pool, pipeline) = open(config).await?;
    let record = pipeline.get_results(id).await;
    pool.close().await;
    let record = record?;

    println!("--- PDF {} ---", record.document_id);
    println!("filename:      {}", record.filename);
    println!("analysis_type: {}", record.analysis_type);
    println!();
    println!("--- Components ({}) ---", record.components.len());
    for component in &record.components {
        println!("{}", component);
    }
    Ok(())
}

/// Writes the export to `output`, or to stdout when no path is given.
pub async fn run_export(
    config: &Config,
    id: i64,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let (pool, pipeline) = open(config).await?;
    let payload = pipeline.export(id, format).await;
    pool.close().await;
    let payload = payload?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &payload.body)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} ({} bytes)", path.display(), payload.body.len());
        }
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&payload.body)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
