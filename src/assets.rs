//! Asset bundle scanning.
//!
//! The deployment step identifies the frontend bundle by a single content
//! hash over every file, so an unchanged bundle re-applies as a no-op and
//! any edit forces exactly one re-deployment.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// A scanned asset bundle.
pub struct Bundle {
    /// Content hash over relative paths and file contents
    pub hash: String,
    /// Number of files in the bundle
    pub files: usize,
}

/// Scan a bundle directory; `None` when the directory does not exist.
///
/// Files are visited in sorted order so the hash is stable across platforms.
pub fn scan(dir: &Path) -> Result<Option<Bundle>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut hasher = blake3::Hasher::new();
    let mut files = 0usize;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("could not walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(dir).unwrap_or_else(|_| entry.path());
        hasher.update(rel.to_string_lossy().as_bytes());
        let contents = fs::read(entry.path())
            .with_context(|| format!("could not read {}", entry.path().display()))?;
        hasher.update(&contents);
        files += 1;
    }

    Ok(Some(Bundle {
        hash: hasher.finalize().to_hex().to_string(),
        files,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = scan(&dir.path().join("nope")).unwrap();
        assert!(bundle.is_none());
    }

    #[test]
    fn hash_is_stable_for_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

        let first = scan(dir.path()).unwrap().unwrap();
        let second = scan(dir.path()).unwrap().unwrap();
        assert_eq!(first.hash, second.hash);
        assert_eq!(first.files, 2);
    }

    #[test]
    fn content_changes_change_the_hash() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        let before = scan(dir.path()).unwrap().unwrap();

        fs::write(dir.path().join("index.html"), "<html>v2</html>").unwrap();
        let after = scan(dir.path()).unwrap().unwrap();
        assert_ne!(before.hash, after.hash);
    }
}
