//! In-memory [`AnalysisStore`] implementation for tests.
//!
//! All three tables live behind one `RwLock`, so a `record_analysis` call is
//! atomic with respect to readers.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{AnalyzerError, Result};
use crate::models::{
    AnalysisRecord, AnalysisRun, Document, ExtractedComponent, ANALYSIS_TYPE, COMPONENT_KEY,
};

use super::{AnalysisStore, ReadPolicy};

#[derive(Default)]
struct Tables {
    /// Highest document id handed out; removed ids are never reused.
    last_document_id: i64,
    documents: Vec<Document>,
    runs: Vec<AnalysisRun>,
    components: Vec<ExtractedComponent>,
}

pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Number of analysis runs recorded for a document.
    pub fn run_count(&self, document_id: i64) -> usize {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables
            .runs
            .iter()
            .filter(|r| r.document_id == document_id)
            .count()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// Ids start at 1 like SQLite's AUTOINCREMENT.
fn next_id(len: usize) -> i64 {
    len as i64 + 1
}

#[async_trait]
impl AnalysisStore for InMemoryStore {
    async fn insert_document(&self, filename: &str) -> Result<Document> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.last_document_id += 1;
        let doc = Document {
            id: tables.last_document_id,
            filename: filename.to_string(),
            uploaded_at: chrono::Utc::now().timestamp(),
        };
        tables.documents.push(doc.clone());
        Ok(doc)
    }

    async fn document(&self, id: i64) -> Result<Option<Document>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables.documents.iter().find(|d| d.id == id).cloned())
    }

    async fn remove_document(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let before = tables.documents.len();
        tables.documents.retain(|d| d.id != id);
        Ok(tables.documents.len() < before)
    }

    async fn record_analysis(&self, document_id: i64, components: &[String]) -> Result<i64> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if !tables.documents.iter().any(|d| d.id == document_id) {
            return Err(AnalyzerError::document_not_found(document_id));
        }

        let analysis_id = next_id(tables.runs.len());
        tables.runs.push(AnalysisRun {
            id: analysis_id,
            document_id,
            analysis_type: ANALYSIS_TYPE.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        });
        for value in components {
            let id = next_id(tables.components.len());
            tables.components.push(ExtractedComponent {
                id,
                analysis_id,
                key: COMPONENT_KEY.to_string(),
                value: value.clone(),
            });
        }
        Ok(analysis_id)
    }

    async fn get_analysis(
        &self,
        document_id: i64,
        policy: ReadPolicy,
    ) -> Result<AnalysisRecord> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let doc = tables
            .documents
            .iter()
            .find(|d| d.id == document_id)
            .ok_or_else(|| AnalyzerError::document_not_found(document_id))?;

        let run_ids: Vec<i64> = tables
            .runs
            .iter()
            .filter(|r| r.document_id == document_id && r.analysis_type == ANALYSIS_TYPE)
            .map(|r| r.id)
            .collect();
        let selected: Vec<i64> = match policy {
            ReadPolicy::Union => run_ids,
            ReadPolicy::Latest => run_ids.into_iter().max().into_iter().collect(),
        };

        // `components` is append-only, so vector order is insertion order.
        let components = tables
            .components
            .iter()
            .filter(|c| c.key == COMPONENT_KEY && selected.contains(&c.analysis_id))
            .map(|c| c.value.clone())
            .collect();

        Ok(AnalysisRecord {
            document_id,
            filename: doc.filename.clone(),
            analysis_type: ANALYSIS_TYPE.to_string(),
            components,
        })
    }

    async fn ping(&self) -> Result<String> {
        Ok("in-memory".to_string())
    }
}
