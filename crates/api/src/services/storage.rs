//! Local-disk storage for uploaded images.
//!
//! Files are written as `<uuid>.<ext>` inside a fixed directory. The client's
//! filename only contributes its extension and is never used as a path.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Extensions accepted for payment proofs.
pub const PAYMENT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Extensions accepted for catalog images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file is empty")]
    Empty,

    #[error("file has no extension")]
    MissingExtension,

    #[error("unsupported file type: .{0}")]
    UnsupportedExtension(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A directory of served files with an extension whitelist.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    public_prefix: String,
    allowed: &'static [&'static str],
}

impl FileStorage {
    /// `public_prefix` is the URL path the directory is served under, e.g.
    /// `payment` for `/payment/<file>`.
    #[must_use]
    pub fn new(
        dir: impl Into<PathBuf>,
        public_prefix: &str,
        allowed: &'static [&'static str],
    ) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.trim_matches('/').to_owned(),
            allowed,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lowercased extension of `original_name` if it is whitelisted.
    ///
    /// # Errors
    ///
    /// Returns `MissingExtension` or `UnsupportedExtension`.
    pub fn check_extension(&self, original_name: &str) -> Result<String, StorageError> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .ok_or(StorageError::MissingExtension)?;

        if self.allowed.contains(&ext.as_str()) {
            Ok(ext)
        } else {
            Err(StorageError::UnsupportedExtension(ext))
        }
    }

    /// Write `bytes` under a fresh random name and return that name.
    ///
    /// # Errors
    ///
    /// Returns `Empty` for zero bytes, an extension error, or `Io` if the
    /// directory or file cannot be written.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        let ext = self.check_extension(original_name)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{}.{ext}", Uuid::new_v4());
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        tracing::debug!(file = %file_name, dir = %self.dir.display(), "Stored upload");
        Ok(file_name)
    }

    /// Delete a previously stored file. Missing files are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Io` for anything other than not-found.
    pub async fn remove(&self, file_name: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Absolute URL for a stored file.
    #[must_use]
    pub fn public_url(&self, base_url: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{file_name}",
            base_url.trim_end_matches('/'),
            self.public_prefix
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_extension_is_case_insensitive() {
        let storage = FileStorage::new("unused", "payment", PAYMENT_EXTENSIONS);
        assert_eq!(storage.check_extension("proof.PNG").unwrap(), "png");
        assert_eq!(storage.check_extension("a.b.JpEg").unwrap(), "jpeg");
        assert!(matches!(
            storage.check_extension("proof.gif"),
            Err(StorageError::UnsupportedExtension(ext)) if ext == "gif"
        ));
        assert!(matches!(
            storage.check_extension("proof"),
            Err(StorageError::MissingExtension)
        ));
    }

    #[test]
    fn test_webp_only_for_catalog_images() {
        let images = FileStorage::new("unused", "uploads", IMAGE_EXTENSIONS);
        let payments = FileStorage::new("unused", "payment", PAYMENT_EXTENSIONS);
        assert!(images.check_extension("shoe.webp").is_ok());
        assert!(payments.check_extension("shoe.webp").is_err());
    }

    #[tokio::test]
    async fn test_save_uses_random_name_inside_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(tmp.path().join("payment"), "/payment/", PAYMENT_EXTENSIONS);

        let name = storage.save("../../etc/passwd.png", b"\x89PNG").await.unwrap();
        assert!(name.ends_with(".png"));
        assert!(!name.contains('/'));
        assert!(tmp.path().join("payment").join(&name).exists());

        assert_eq!(
            storage.public_url("http://localhost:3000/", &name),
            format!("http://localhost:3000/payment/{name}")
        );

        storage.remove(&name).await.unwrap();
        storage.remove(&name).await.unwrap();
        assert!(!tmp.path().join("payment").join(&name).exists());
    }

    #[tokio::test]
    async fn test_save_rejects_empty_files() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(tmp.path(), "uploads", IMAGE_EXTENSIONS);
        assert!(matches!(
            storage.save("a.png", b"").await,
            Err(StorageError::Empty)
        ));
    }
}
