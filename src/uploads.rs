//! On-disk storage for uploaded PDF bytes.
//!
//! Files are stored as `<id>_<sanitized filename>` under the configured
//! upload directory, so two uploads with the same name never collide. Bytes
//! are first staged under a temporary name and renamed once the catalog row
//! (and therefore the id) exists.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use unicode_normalization::UnicodeNormalization;

use crate::config::UploadsConfig;
use crate::error::{AnalyzerError, Result};

static STAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Reduces a client-supplied filename to a safe ASCII basename.
///
/// Accented letters are decomposed (NFKD) to their ASCII base, then path
/// separators become word breaks, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped, and leading/trailing `.`/`_` are
/// trimmed. May return an empty string.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name
        .nfkd()
        .filter(|c| c.is_ascii())
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// True if `name` has an extension in `allowed` (case-insensitive).
pub fn allowed_file(name: &str, allowed: &[String]) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
    allowed_extensions: Vec<String>,
    max_bytes: usize,
}

impl UploadDir {
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            root: config.dir.clone(),
            allowed_extensions: config.allowed_extensions.clone(),
            max_bytes: config.max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Checks an incoming upload and returns the sanitized filename to store.
    pub fn validate(&self, filename: &str, len: usize) -> Result<String> {
        if filename.is_empty() {
            return Err(AnalyzerError::InvalidArgument("No selected file".into()));
        }
        if !allowed_file(filename, &self.allowed_extensions) {
            return Err(AnalyzerError::InvalidArgument(format!(
                "Invalid file type for {}. Allowed: {}",
                filename,
                self.allowed_extensions.join(", ")
            )));
        }
        if len > self.max_bytes {
            return Err(AnalyzerError::InvalidArgument(format!(
                "File too large: {} bytes (max {})",
                len, self.max_bytes
            )));
        }
        let safe = secure_filename(filename);
        if safe.is_empty() || !allowed_file(&safe, &self.allowed_extensions) {
            return Err(AnalyzerError::InvalidArgument(format!(
                "Unusable filename: {}",
                filename
            )));
        }
        Ok(safe)
    }

    pub fn path_for(&self, document_id: i64, filename: &str) -> PathBuf {
        self.root.join(format!("{}_{}", document_id, filename))
    }

    /// Writes `bytes` under a temporary name and returns its path.
    pub async fn stage(&self, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await?;
        let seq = STAGE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let staged = self.root.join(format!(
            ".staged-{}-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            seq
        ));
        tokio::fs::write(&staged, bytes).await?;
        Ok(staged)
    }

    /// Moves a staged file to its final location for `document_id`.
    pub async fn commit(&self, staged: &Path, document_id: i64, filename: &str) -> Result<PathBuf> {
        let target = self.path_for(document_id, filename);
        tokio::fs::rename(staged, &target).await?;
        Ok(target)
    }

    /// Best-effort removal of a staged file after a failed upload.
    pub async fn discard(&self, staged: &Path) {
        if let Err(e) = tokio::fs::remove_file(staged).await {
            tracing::warn!(path = %staged.display(), error = %e, "failed to remove staged upload");
        }
    }

    pub async fn read(&self, document_id: i64, filename: &str) -> Result<Vec<u8>> {
        let path = self.path_for(document_id, filename);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AnalyzerError::FileMissing(path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_dir(root: &Path) -> UploadDir {
        UploadDir::new(&UploadsConfig {
            dir: root.to_path_buf(),
            allowed_extensions: vec!["pdf".to_string()],
            max_bytes: 1024,
        })
    }

    #[test]
    fn secure_filename_strips_paths_and_symbols() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("My Manual (v2).pdf"), "My_Manual_v2.pdf");
        assert_eq!(secure_filename("  lathe.pdf "), "lathe.pdf");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn secure_filename_keeps_base_of_accented_letters() {
        assert_eq!(secure_filename("Über.pdf"), "Uber.pdf");
        assert_eq!(secure_filename("Fräsmaschine Ölpumpe.pdf"), "Frasmaschine_Olpumpe.pdf");
        assert_eq!(secure_filename("ﬁle.pdf"), "file.pdf");
        assert_eq!(secure_filename("图纸.pdf"), "pdf");
    }

    #[test]
    fn allowed_file_checks_extension() {
        let allowed = vec!["pdf".to_string()];
        assert!(allowed_file("a.pdf", &allowed));
        assert!(allowed_file("a.PDF", &allowed));
        assert!(!allowed_file("a.pdf.exe", &allowed));
        assert!(!allowed_file("pdf", &allowed));
    }

    #[test]
    fn validate_rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = upload_dir(dir.path());

        assert!(matches!(
            uploads.validate("", 10),
            Err(AnalyzerError::InvalidArgument(_))
        ));
        assert!(matches!(
            uploads.validate("notes.txt", 10),
            Err(AnalyzerError::InvalidArgument(_))
        ));
        assert!(matches!(
            uploads.validate("big.pdf", 4096),
            Err(AnalyzerError::InvalidArgument(_))
        ));
        assert_eq!(uploads.validate("ok file.pdf", 10).unwrap(), "ok_file.pdf");
    }

    #[tokio::test]
    async fn stage_commit_read() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = upload_dir(dir.path());

        let staged = uploads.stage(b"%PDF-1.4").await.unwrap();
        let target = uploads.commit(&staged, 5, "a.pdf").await.unwrap();
        assert!(!staged.exists());
        assert_eq!(target, dir.path().join("5_a.pdf"));
        assert_eq!(uploads.read(5, "a.pdf").await.unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = upload_dir(dir.path());
        assert!(matches!(
            uploads.read(1, "gone.pdf").await,
            Err(AnalyzerError::FileMissing(_))
        ));
    }
}
