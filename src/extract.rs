//! Best-effort plain-text extraction for uploaded PDFs.
//!
//! Extraction never fails from the caller's point of view. Any parse error,
//! decryption failure, library panic, or timeout produces empty text plus an
//! [`ExtractError`] describing why. An image-only or broken PDF therefore
//! still yields a "zero components found" analysis.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use thiserror::Error;

/// Why extraction was downgraded to empty text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("PDF extraction panicked (malformed document)")]
    Panicked,
    #[error("PDF extraction timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
    #[error("PDF extraction task failed: {0}")]
    Join(String),
}

/// Text pulled from a document, plus the reason it is empty if extraction
/// did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub degraded: Option<ExtractError>,
}

impl Extraction {
    fn complete(text: String) -> Self {
        Self {
            text,
            degraded: None,
        }
    }

    fn degraded(reason: ExtractError) -> Self {
        tracing::warn!(reason = %reason, "text extraction degraded to empty text");
        Self {
            text: String::new(),
            degraded: Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Extracts text from PDF bytes on the current thread.
///
/// Pages are concatenated in document order. `pdf_extract` can panic on
/// malformed input, so the call runs inside `catch_unwind`.
pub fn extract_text(bytes: &[u8]) -> Extraction {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));
    match result {
        Ok(Ok(text)) => {
            tracing::debug!(chars = text.len(), "text extracted");
            Extraction::complete(text)
        }
        Ok(Err(e)) => Extraction::degraded(ExtractError::Pdf(e.to_string())),
        Err(_) => Extraction::degraded(ExtractError::Panicked),
    }
}

/// Extracts text on a blocking thread, giving up after `timeout`.
///
/// Untrusted PDFs can stall the parser indefinitely. On timeout the blocking
/// task is detached (it cannot be cancelled) and the caller gets a degraded
/// result immediately.
pub async fn extract_text_with_timeout(bytes: Vec<u8>, timeout: Duration) -> Extraction {
    run_bounded(move || extract_text(&bytes), timeout).await
}

async fn run_bounded<F>(job: F, timeout: Duration) -> Extraction
where
    F: FnOnce() -> Extraction + Send + 'static,
{
    let task = tokio::task::spawn_blocking(job);
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(extraction)) => extraction,
        Ok(Err(e)) => Extraction::degraded(ExtractError::Join(e.to_string())),
        Err(_) => Extraction::degraded(ExtractError::TimedOut(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_degrades_to_empty_text() {
        let out = extract_text(b"not a pdf");
        assert!(out.text.is_empty());
        assert!(out.is_degraded());
    }

    #[test]
    fn empty_input_degrades_to_empty_text() {
        let out = extract_text(&[]);
        assert!(out.text.is_empty());
        assert!(out.is_degraded());
    }

    #[tokio::test]
    async fn async_extraction_degrades_on_garbage() {
        let out =
            extract_text_with_timeout(b"%PDF-1.4 garbage".to_vec(), Duration::from_secs(10)).await;
        assert!(out.text.is_empty());
        assert!(out.is_degraded());
    }

    #[tokio::test]
    async fn slow_job_times_out() {
        let out = run_bounded(
            || {
                std::thread::sleep(Duration::from_millis(500));
                Extraction::complete("late".into())
            },
            Duration::from_millis(20),
        )
        .await;
        assert_eq!(
            out.degraded,
            Some(ExtractError::TimedOut(Duration::from_millis(20)))
        );
        assert!(out.text.is_empty());
    }

    #[tokio::test]
    async fn fast_job_passes_through() {
        let out = run_bounded(
            || Extraction::complete("spindle HSK".into()),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(out.text, "spindle HSK");
        assert!(!out.is_degraded());
    }

    #[tokio::test]
    async fn panicking_job_is_absorbed() {
        let out = run_bounded(|| panic!("boom"), Duration::from_secs(5)).await;
        assert!(matches!(out.degraded, Some(ExtractError::Join(_))));
    }

    #[test]
    fn degraded_reasons_render_for_logs() {
        assert_eq!(
            ExtractError::TimedOut(Duration::from_millis(20)).to_string(),
            "PDF extraction timed out after 20ms"
        );
        assert_eq!(
            ExtractError::Pdf("bad xref".into()).to_string(),
            "PDF extraction failed: bad xref"
        );
        let err: &dyn std::error::Error = &ExtractError::Panicked;
        assert!(err.to_string().contains("panicked"));
    }
}
