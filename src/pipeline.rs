//! The upload → analyze → results/export workflow.
//!
//! [`Pipeline`] owns every collaborator an operation needs (store handle,
//! upload directory, matcher) and is shared by the HTTP server and the CLI.
//! It holds no per-request state.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::export::{self, ExportFormat, ExportPayload};
use crate::extract;
use crate::matcher::ComponentMatcher;
use crate::models::{AnalysisRecord, AnalyzeSummary, UploadSummary};
use crate::store::{AnalysisStore, ReadPolicy};
use crate::uploads::UploadDir;

pub struct Pipeline {
    store: Arc<dyn AnalysisStore>,
    uploads: UploadDir,
    matcher: Arc<ComponentMatcher>,
    extraction_timeout: Duration,
    read_policy: ReadPolicy,
}

impl Pipeline {
    pub fn new(store: Arc<dyn AnalysisStore>, uploads: UploadDir) -> Self {
        Self {
            store,
            uploads,
            matcher: Arc::new(ComponentMatcher::new()),
            extraction_timeout: Duration::from_secs(30),
            read_policy: ReadPolicy::Union,
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn AnalysisStore>) -> Self {
        Self::new(store, UploadDir::new(&config.uploads))
            .with_extraction_timeout(Duration::from_secs(config.extraction.timeout_secs))
            .with_read_policy(config.analysis.read_policy)
    }

    pub fn with_matcher(mut self, matcher: ComponentMatcher) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    pub fn with_read_policy(mut self, policy: ReadPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    pub fn uploads(&self) -> &UploadDir {
        &self.uploads
    }

    /// Stores the bytes and catalogs the document.
    ///
    /// A failure at any step removes the staged bytes, and the catalog row
    /// too if it was already inserted.
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadSummary> {
        let safe_name = self.uploads.validate(filename, bytes.len())?;
        let staged = self.uploads.stage(bytes).await?;

        let doc = match self.store.insert_document(&safe_name).await {
            Ok(doc) => doc,
            Err(e) => {
                self.uploads.discard(&staged).await;
                return Err(e);
            }
        };
        let path = match self.uploads.commit(&staged, doc.id, &doc.filename).await {
            Ok(path) => path,
            Err(e) => {
                self.uploads.discard(&staged).await;
                if let Err(cleanup) = self.store.remove_document(doc.id).await {
                    tracing::error!(
                        pdf_id = doc.id,
                        error = %cleanup,
                        "failed to remove catalog row after failed upload"
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(pdf_id = doc.id, path = %path.display(), "PDF uploaded");
        Ok(UploadSummary {
            pdf_id: doc.id,
            filename: doc.filename,
        })
    }

    /// Extracts text, matches components, and records one analysis run.
    ///
    /// Fails with `NotFound` before touching anything if the document is
    /// unknown. A PDF whose text cannot be extracted still produces a run,
    /// with zero components and `extraction_degraded` set.
    pub async fn analyze(&self, document_id: i64) -> Result<AnalyzeSummary> {
        let filename = self.store.filename_for(document_id).await?;
        let bytes = self.uploads.read(document_id, &filename).await?;

        let extraction =
            extract::extract_text_with_timeout(bytes, self.extraction_timeout).await;
        if let Some(reason) = &extraction.degraded {
            tracing::debug!(document_id, %reason, "analyzing empty text");
        }

        let outcome = self.matcher.match_components(&extraction.text);
        if !outcome.skipped_rules.is_empty() {
            tracing::warn!(
                document_id,
                skipped = ?outcome.skipped_rules,
                "some component rules were skipped"
            );
        }

        let analysis_id = self
            .store
            .record_analysis(document_id, &outcome.components)
            .await?;

        Ok(AnalyzeSummary {
            analysis_id,
            components_found: outcome.components.len(),
            extraction_degraded: extraction.is_degraded(),
        })
    }

    pub async fn get_results(&self, document_id: i64) -> Result<AnalysisRecord> {
        self.store.get_analysis(document_id, self.read_policy).await
    }

    /// Renders the document's results as `format` (`json` or `csv`).
    ///
    /// An unknown document is reported before an unsupported format.
    pub async fn export(&self, document_id: i64, format: &str) -> Result<ExportPayload> {
        let record = self.get_results(document_id).await?;
        let format: ExportFormat = format.parse()?;
        export::render(&record, format)
    }
}
