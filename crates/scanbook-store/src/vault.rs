// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-addressed storage for document and cover bytes.
//
// Files are named by the SHA-256 of their contents, so storing the same scan
// twice writes it once. Book records keep the returned paths.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use scanbook_core::error::{Result, ScanbookError};

const DOCUMENTS_DIR: &str = "documents";
const COVERS_DIR: &str = "covers";

/// Compute the SHA-256 hex digest of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// On-disk store for PDFs and cover JPEGs.
#[derive(Debug, Clone)]
pub struct DocumentVault {
    root: PathBuf,
}

impl DocumentVault {
    /// Use `root` as the vault directory, creating its layout if needed.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(DOCUMENTS_DIR))?;
        std::fs::create_dir_all(root.join(COVERS_DIR))?;
        debug!("document vault ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a PDF; returns its path.
    pub fn store_document(&self, pdf: &[u8]) -> Result<PathBuf> {
        self.store(DOCUMENTS_DIR, "pdf", pdf)
    }

    /// Store a cover JPEG; returns its path.
    pub fn store_cover(&self, jpeg: &[u8]) -> Result<PathBuf> {
        self.store(COVERS_DIR, "jpg", jpeg)
    }

    /// Read back a file referenced by a book record.
    pub fn load(&self, reference: &str) -> Result<Vec<u8>> {
        let path = Path::new(reference);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ScanbookError::NotFound(format!("file {}", path.display())))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, dir: &str, extension: &str, data: &[u8]) -> Result<PathBuf> {
        let hash = hash_bytes(data);
        let path = self.root.join(dir).join(format!("{hash}.{extension}"));
        if path.exists() {
            debug!(%hash, "already in vault");
            return Ok(path);
        }

        // Write then rename so a crash never leaves a truncated file under
        // the final name.
        let partial = path.with_extension(format!("{extension}.part"));
        std::fs::write(&partial, data)?;
        std::fs::rename(&partial, &path)?;

        info!(%hash, bytes = data.len(), dir, "stored in vault");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sha256() {
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn identical_content_is_stored_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = DocumentVault::open(dir.path()).expect("open");

        let first = vault.store_document(b"%PDF-1.5 fake").expect("store");
        let second = vault.store_document(b"%PDF-1.5 fake").expect("store");
        assert_eq!(first, second);
        assert!(first.starts_with(dir.path().join("documents")));
        assert_eq!(vault.load(&first.display().to_string()).expect("load"), b"%PDF-1.5 fake");
    }

    #[test]
    fn covers_go_to_their_own_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = DocumentVault::open(dir.path()).expect("open");
        let cover = vault.store_cover(&[0xFF, 0xD8, 0xFF]).expect("store");
        assert_eq!(cover.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert!(cover.starts_with(dir.path().join("covers")));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = DocumentVault::open(dir.path()).expect("open");
        assert!(matches!(
            vault.load("documents/nope.pdf"),
            Err(ScanbookError::NotFound(_))
        ));
    }
}
