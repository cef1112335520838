//! Storage abstraction for documents and their analysis runs.
//!
//! The [`AnalysisStore`] trait is the only thing the pipeline and the HTTP
//! layer know about persistence. The handle is injected (usually as
//! `Arc<dyn AnalysisStore>`) rather than opened per request.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`insert_document`](AnalysisStore::insert_document) | Catalog an uploaded PDF |
//! | [`document`](AnalysisStore::document) | Look up a catalog row |
//! | [`remove_document`](AnalysisStore::remove_document) | Undo a catalog insert |
//! | [`filename_for`](AnalysisStore::filename_for) | Filename or `NotFound` |
//! | [`record_analysis`](AnalysisStore::record_analysis) | Create a run and its component rows atomically |
//! | [`get_analysis`](AnalysisStore::get_analysis) | Reassemble a document's component list |
//! | [`ping`](AnalysisStore::ping) | Backend version, for health checks |

pub mod memory;
pub mod sqlite;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AnalyzerError, Result};
use crate::models::{AnalysisRecord, Document};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Which runs contribute to a document's visible component list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadPolicy {
    /// Every run, in original insertion order. Re-analyzing a document
    /// appends another copy of its components.
    #[default]
    Union,
    /// Only the most recent run.
    Latest,
}

impl FromStr for ReadPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "union" => Ok(ReadPolicy::Union),
            "latest" => Ok(ReadPolicy::Latest),
            other => Err(format!("unknown read policy: {}", other)),
        }
    }
}

impl fmt::Display for ReadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadPolicy::Union => f.write_str("union"),
            ReadPolicy::Latest => f.write_str("latest"),
        }
    }
}

/// Persistence backend for uploaded documents and analysis results.
///
/// Implementations must be `Send + Sync` so a single handle can be shared
/// across request handlers.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Catalogs a new document and returns it with its generated id.
    async fn insert_document(&self, filename: &str) -> Result<Document>;

    async fn document(&self, id: i64) -> Result<Option<Document>>;

    /// Deletes a document that has no analysis runs yet. Returns whether a
    /// row was removed. Used to undo a catalog insert whose file never
    /// reached disk.
    async fn remove_document(&self, id: i64) -> Result<bool>;

    async fn filename_for(&self, id: i64) -> Result<String> {
        self.document(id)
            .await?
            .map(|d| d.filename)
            .ok_or_else(|| AnalyzerError::document_not_found(id))
    }

    /// Creates one analysis run for `document_id` and one component row per
    /// entry of `components`, in the given order, as a single unit.
    ///
    /// Fails with `NotFound` if the document does not exist. On any failure
    /// nothing is persisted. The store does not deduplicate.
    async fn record_analysis(&self, document_id: i64, components: &[String]) -> Result<i64>;

    /// Returns the document's filename and component list under `policy`.
    ///
    /// A document that was never analyzed yields an empty list, exactly like
    /// one whose runs matched nothing.
    async fn get_analysis(&self, document_id: i64, policy: ReadPolicy)
        -> Result<AnalysisRecord>;

    async fn ping(&self) -> Result<String>;
}
