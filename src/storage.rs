//! Temporary file store for uploaded report PDFs.
//!
//! Every upload lives exactly as long as one analysis request. The
//! `StoredUpload` handle deletes its file on drop, so deletion happens on
//! every exit path of the handler, including panics unwinding through it.
//! `sweep` removes orphans left behind by a previous crash.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Uploaded file is not a PDF")]
    NotAPdf,

    #[error("Failed to write upload to temporary storage: {0}")]
    Write(#[source] std::io::Error),
}

/// Scratch directory holding in-flight uploads.
pub struct TempStore {
    dir: PathBuf,
}

/// Handle to one stored upload. Removing the file is tied to this value's
/// lifetime; dropping it is the release.
#[derive(Debug)]
pub struct StoredUpload {
    path: PathBuf,
    original_name: String,
}

impl TempStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default location under the system temp directory.
    pub fn default_location() -> Self {
        Self::new(std::env::temp_dir().join("labsight-uploads"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist uploaded bytes under a collision-resistant name that keeps
    /// the original extension (`pdf` when the name has none).
    pub fn store(&self, bytes: &[u8], original_name: &str) -> Result<StoredUpload, StorageError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(StorageError::NotAPdf);
        }

        std::fs::create_dir_all(&self.dir).map_err(StorageError::Write)?;

        let sanitized = sanitize_filename(original_name);
        let extension = Path::new(&sanitized)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("pdf")
            .to_string();

        let unique = format!(
            "{}-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            Uuid::new_v4(),
            extension
        );
        let path = self.dir.join(unique);

        std::fs::write(&path, bytes).map_err(StorageError::Write)?;

        tracing::debug!(
            path = %path.display(),
            size = bytes.len(),
            original = %sanitized,
            "Upload staged"
        );

        Ok(StoredUpload {
            path,
            original_name: sanitized,
        })
    }

    /// Remove every file in the store. Called once at startup to clear
    /// uploads orphaned by a crash; failures are logged and ignored.
    pub fn sweep(&self) {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            if let Err(e) = std::fs::remove_file(entry.path()) {
                tracing::warn!(path = %entry.path().display(), "Orphan sweep failed: {e}");
            } else {
                tracing::info!(path = %entry.path().display(), "Removed orphaned upload");
            }
        }
    }
}

impl StoredUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Delete the file now instead of at end of scope. Same guarantees as
    /// the drop path; failures are swallowed.
    pub fn release(self) {}
}

impl Drop for StoredUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            // Already-deleted is not worth a warning on the release path.
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "Temp upload cleanup failed: {e}");
            }
        } else {
            tracing::debug!(path = %self.path.display(), "Temp upload removed");
        }
    }
}

/// Sanitize a filename — removes path traversal and special characters.
fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.replace("..", "");

    // Truncate by chars, not bytes: alphanumerics above ASCII survive the
    // filter, so a byte slice could split a code point.
    let sanitized: String = sanitized.chars().take(100).collect();

    if sanitized.is_empty() {
        "report".into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF_BYTES: &[u8] = b"%PDF-1.4 minimal test content";

    fn test_store() -> (tempfile::TempDir, TempStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TempStore::new(dir.path().join("uploads"));
        (dir, store)
    }

    #[test]
    fn store_writes_file_with_original_extension() {
        let (_dir, store) = test_store();
        let stored = store.store(PDF_BYTES, "bloods.pdf").unwrap();
        assert!(stored.path().exists());
        assert_eq!(stored.path().extension().unwrap(), "pdf");
        assert_eq!(std::fs::read(stored.path()).unwrap(), PDF_BYTES);
    }

    #[test]
    fn missing_extension_defaults_to_pdf() {
        let (_dir, store) = test_store();
        let stored = store.store(PDF_BYTES, "bloods").unwrap();
        assert_eq!(stored.path().extension().unwrap(), "pdf");
    }

    #[test]
    fn stored_names_are_collision_resistant() {
        let (_dir, store) = test_store();
        let a = store.store(PDF_BYTES, "same.pdf").unwrap();
        let b = store.store(PDF_BYTES, "same.pdf").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn drop_deletes_the_file() {
        let (_dir, store) = test_store();
        let stored = store.store(PDF_BYTES, "bloods.pdf").unwrap();
        let path = stored.path().to_path_buf();
        drop(stored);
        assert!(!path.exists());
    }

    #[test]
    fn release_deletes_the_file() {
        let (_dir, store) = test_store();
        let stored = store.store(PDF_BYTES, "bloods.pdf").unwrap();
        let path = stored.path().to_path_buf();
        stored.release();
        assert!(!path.exists());
    }

    #[test]
    fn double_delete_is_silent() {
        let (_dir, store) = test_store();
        let stored = store.store(PDF_BYTES, "bloods.pdf").unwrap();
        std::fs::remove_file(stored.path()).unwrap();
        drop(stored); // must not panic
    }

    #[test]
    fn non_pdf_content_is_rejected() {
        let (_dir, store) = test_store();
        let err = store.store(b"GIF89a not a report", "bloods.pdf").unwrap_err();
        assert!(matches!(err, StorageError::NotAPdf));
    }

    #[test]
    fn sweep_clears_orphans() {
        let (_dir, store) = test_store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join("orphan.pdf"), PDF_BYTES).unwrap();
        store.sweep();
        assert_eq!(std::fs::read_dir(store.dir()).unwrap().count(), 0);
    }

    #[test]
    fn sanitize_strips_path_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("my report (1).pdf"), "my_report__1_.pdf");
        assert_eq!(sanitize_filename(""), "report");
    }

    #[test]
    fn sanitize_truncates_long_multibyte_names_on_char_boundaries() {
        let name = format!("{}.pdf", "血液検査報告書".repeat(20));
        let sanitized = sanitize_filename(&name);
        assert_eq!(sanitized.chars().count(), 100);
        assert!(sanitized.starts_with("血液検査"));
    }

    #[test]
    fn multibyte_filenames_can_be_stored() {
        let (_dir, store) = test_store();
        let name = format!("{}.pdf", "血".repeat(120));
        let stored = store.store(PDF_BYTES, &name).unwrap();
        assert!(stored.path().exists());
    }
}
