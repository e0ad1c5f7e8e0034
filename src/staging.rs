//! Local staging for upload payloads
//!
//! Uploaded bytes are written under a per-request directory before
//! submission to the storage node. The per-request UUID keeps concurrent
//! uploads with the same declared file name from colliding, and declared
//! names are checked against path traversal before any path is built.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, WicketError};

/// Staging area rooted at a configured directory.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

/// A staged upload on disk.
///
/// Call [`StagedFile::discard`] once the submission attempt is over;
/// staged content is never kept past the request.
#[derive(Debug)]
pub struct StagedFile {
    /// Full path of the staged payload
    pub path: PathBuf,
    /// Sanitized file name (the final path component)
    pub name: String,
    dir: PathBuf,
}

impl StagingArea {
    /// Create the staging area, ensuring the root directory exists.
    pub async fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        debug!(path = %root.display(), "Staging area ready");
        Ok(Self { root })
    }

    /// Write payload bytes under a fresh per-request directory.
    ///
    /// Rejects declared names containing path separators or dot
    /// components, so a crafted name cannot escape the staging root.
    pub async fn stage(&self, declared_name: &str, data: &[u8]) -> Result<StagedFile> {
        let name = sanitize_file_name(declared_name).ok_or_else(|| {
            WicketError::Validation(format!("invalid file name: {:?}", declared_name))
        })?;

        let dir = self.root.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&dir).await?;

        let path = dir.join(&name);
        fs::write(&path, data).await?;
        debug!(path = %path.display(), size = data.len(), "Staged upload");

        Ok(StagedFile { path, name, dir })
    }
}

impl StagedFile {
    /// Remove the staged payload and its per-request directory.
    ///
    /// Removal failure is logged, not propagated: the submission outcome
    /// has already been decided by the time cleanup runs.
    pub async fn discard(self) {
        if let Err(e) = fs::remove_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "Failed to remove staged upload");
        }
    }
}

/// Validate a declared file name for use as a single path component.
///
/// Returns `None` for empty names, bare dot components, and names
/// containing path separators or NUL.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return None;
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed.contains('\0') {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_accepts_plain_names() {
        assert_eq!(
            sanitize_file_name("report.pdf"),
            Some("report.pdf".to_string())
        );
        assert_eq!(
            sanitize_file_name("archive.tar.gz"),
            Some("archive.tar.gz".to_string())
        );
        // Interior dots are harmless
        assert_eq!(sanitize_file_name("a..b"), Some("a..b".to_string()));
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert_eq!(sanitize_file_name("../etc/passwd"), None);
        assert_eq!(sanitize_file_name("..\\windows"), None);
        assert_eq!(sanitize_file_name("dir/file"), None);
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("."), None);
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name("   "), None);
        assert_eq!(sanitize_file_name("nul\0byte"), None);
    }

    #[tokio::test]
    async fn test_stage_writes_payload() {
        let tmp = TempDir::new().unwrap();
        let staging = StagingArea::new(tmp.path()).await.unwrap();

        let staged = staging.stage("report.pdf", b"payload").await.unwrap();
        assert_eq!(staged.name, "report.pdf");
        assert_eq!(fs::read(&staged.path).await.unwrap(), b"payload");

        staged.discard().await;
    }

    #[tokio::test]
    async fn test_same_name_stages_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let staging = StagingArea::new(tmp.path()).await.unwrap();

        let a = staging.stage("data.bin", b"aaa").await.unwrap();
        let b = staging.stage("data.bin", b"bbb").await.unwrap();

        assert_ne!(a.path, b.path);
        assert_eq!(fs::read(&a.path).await.unwrap(), b"aaa");
        assert_eq!(fs::read(&b.path).await.unwrap(), b"bbb");

        a.discard().await;
        b.discard().await;
    }

    #[tokio::test]
    async fn test_discard_removes_request_directory() {
        let tmp = TempDir::new().unwrap();
        let staging = StagingArea::new(tmp.path()).await.unwrap();

        let staged = staging.stage("report.pdf", b"payload").await.unwrap();
        let dir = staged.path.parent().unwrap().to_path_buf();
        assert!(fs::metadata(&dir).await.is_ok());

        staged.discard().await;
        assert!(fs::metadata(&dir).await.is_err());
    }

    #[tokio::test]
    async fn test_stage_rejects_traversal_name() {
        let tmp = TempDir::new().unwrap();
        let staging = StagingArea::new(tmp.path()).await.unwrap();

        let err = staging.stage("../escape", b"x").await.unwrap_err();
        assert!(matches!(err, WicketError::Validation(_)));
    }
}
