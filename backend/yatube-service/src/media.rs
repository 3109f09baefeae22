//! Uploaded post images on local disk
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Subdirectory of the media root that post images live under
pub const POSTS_UPLOAD_DIR: &str = "posts";

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    base_url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            root: root.into(),
            base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store image bytes and return the stored name (`posts/<uuid>.<ext>`).
    pub async fn save_post_image(&self, bytes: &[u8], extension: &str) -> Result<String> {
        let name = format!("{}/{}.{}", POSTS_UPLOAD_DIR, Uuid::new_v4(), extension);
        let path = self.root.join(&name);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        debug!(image = %name, size = bytes.len(), "Stored post image");
        Ok(name)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(image = %name, "Stored image already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Absolute path of a stored name. Names escaping the media root are rejected.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let safe = relative
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        if !safe {
            return Err(AppError::StorageError(format!(
                "invalid media path: {}",
                name
            )));
        }
        Ok(self.root.join(relative))
    }

    /// Public URL of a stored name.
    pub fn url(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), "/media");

        let name = storage.save_post_image(b"GIF89a", "gif").await.unwrap();
        assert!(name.starts_with("posts/"));
        assert!(name.ends_with(".gif"));

        let path = storage.resolve(&name).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"GIF89a");

        storage.delete(&name).await.unwrap();
        assert!(!path.exists());
        storage.delete(&name).await.unwrap();
    }

    #[test]
    fn test_url_and_traversal() {
        let storage = MediaStorage::new("/srv/media", "/media");
        assert_eq!(storage.url("posts/a.gif"), "/media/posts/a.gif");
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
    }
}
