//! Error taxonomy for the analysis pipeline.
//!
//! Text extraction never fails (see [`crate::extract::Extraction`]) and a
//! broken matcher rule is skipped rather than raised, so neither appears
//! here. Everything below propagates to the caller, which translates it into
//! a CLI message or an HTTP status.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The requested document (or its analysis) does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Caller-supplied value was rejected (unsupported export format,
    /// disallowed filename, oversized upload).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The catalog row exists but the uploaded bytes are gone from disk.
    #[error("stored file missing: {}", .0.display())]
    FileMissing(PathBuf),

    /// Transactional persistence failure. The write has been rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AnalyzerError {
    pub fn document_not_found(id: i64) -> Self {
        AnalyzerError::NotFound(format!("PDF with id {}", id))
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        AnalyzerError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for AnalyzerError {
    fn from(e: csv::Error) -> Self {
        AnalyzerError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_document() {
        let err = AnalyzerError::document_not_found(42);
        assert_eq!(err.to_string(), "PDF with id 42 not found");
    }

    #[test]
    fn invalid_argument_carries_value() {
        let err = AnalyzerError::InvalidArgument("unsupported format: xml".into());
        assert!(err.to_string().contains("xml"));
    }
}
