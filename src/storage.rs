//! Profile picture storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::{Result, TollgateError};

/// Accepted upload content types and the extension stored for each.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

/// File extension for an accepted image content type.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

/// Stores profile pictures and returns where they can be found.
#[async_trait]
pub trait ProfileImageStore: Send + Sync {
    /// Store `data` for `user_id` and return its location.
    async fn save_profile_picture(
        &self,
        user_id: i64,
        content_type: &str,
        data: &[u8],
    ) -> Result<String>;
}

/// Stores pictures under a local directory.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalImageStore {
    /// Store under `root`. With a `public_base_url`, returned locations are
    /// URLs below it; otherwise they are file paths.
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    /// Directory pictures are written under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ProfileImageStore for LocalImageStore {
    async fn save_profile_picture(
        &self,
        user_id: i64,
        content_type: &str,
        data: &[u8],
    ) -> Result<String> {
        let ext = image_extension(content_type).ok_or_else(|| {
            TollgateError::Validation(format!("unsupported image type: {content_type}"))
        })?;

        let object_name = format!(
            "profile-pictures/{user_id}-{}.{ext}",
            uuid::Uuid::new_v4().simple()
        );
        let destination = self.root.join(&object_name);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&destination, data).await?;
        debug!(user_id, path = %destination.display(), bytes = data.len(), "Stored profile picture");

        Ok(match &self.public_base_url {
            Some(base) => format!("{}/{object_name}", base.trim_end_matches('/')),
            None => destination.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("image/PNG"), Some("png"));
        assert_eq!(image_extension("image/webp; charset=binary"), Some("webp"));
        assert_eq!(image_extension("image/gif"), None);
        assert_eq!(image_extension("text/plain"), None);
        assert_eq!(image_extension(""), None);
    }

    #[tokio::test]
    async fn test_save_locally() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), None);

        let location = store
            .save_profile_picture(7, "image/png", b"\x89PNG fake")
            .await
            .unwrap();

        let path = PathBuf::from(&location);
        assert!(path.starts_with(dir.path().join("profile-pictures")));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("7-"));
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_save_with_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), Some("https://cdn.example.com/".to_string()));

        let location = store
            .save_profile_picture(3, "image/jpeg", b"jpeg")
            .await
            .unwrap();
        assert!(location.starts_with("https://cdn.example.com/profile-pictures/3-"));
        assert!(location.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), None);
        let a = store.save_profile_picture(1, "image/webp", b"a").await.unwrap();
        let b = store.save_profile_picture(1, "image/webp", b"b").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_rejects_other_types() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), None);
        let result = store.save_profile_picture(1, "application/pdf", b"%PDF").await;
        assert!(matches!(result, Err(TollgateError::Validation(_))));
    }
}
