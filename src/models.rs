//! Core data models used throughout the analyzer.
//!
//! These mirror the three tables created by [`crate::migrate`]: uploaded
//! documents, analysis runs, and the component rows each run produced.

use serde::Serialize;

/// The only analysis type this service produces.
pub const ANALYSIS_TYPE: &str = "component_extraction";

/// Key stored alongside every extracted component value.
pub const COMPONENT_KEY: &str = "component_name";

/// An uploaded PDF and its catalog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub uploaded_at: i64,
}

/// One execution of the extraction pipeline against a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRun {
    pub id: i64,
    pub document_id: i64,
    pub analysis_type: String,
    pub created_at: i64,
}

/// A matched component value belonging to an analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedComponent {
    /// Insertion sequence; read order is ascending on this.
    pub id: i64,
    pub analysis_id: i64,
    pub key: String,
    pub value: String,
}

/// The assembled view of a document's analysis, as returned by the results
/// and export operations.
///
/// Field names match the JSON body of `GET /analysis_results/{pdf_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRecord {
    #[serde(rename = "pdf_id")]
    pub document_id: i64,
    #[serde(rename = "pdf_filename")]
    pub filename: String,
    pub analysis_type: String,
    pub components: Vec<String>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub pdf_id: i64,
    pub filename: String,
}

/// Result of a successful analyze call.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeSummary {
    pub analysis_id: i64,
    pub components_found: usize,
    /// `true` when text extraction failed and the run was recorded against
    /// empty text.
    pub extraction_degraded: bool,
}
