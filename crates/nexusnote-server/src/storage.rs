//! Local-disk file storage for image and PDF uploads.

use chrono::Utc;
use nexusnote_core::{storage_path, MediaKind, NexusError};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::error::AppError;

/// Location of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub path: String,
    pub url: String,
}

/// Files kept under `root/<user_id>/<millis>.<ext>`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/files/{}", self.public_url, path)
    }

    /// Validate and write an upload for `user_id`
    pub async fn save(
        &self,
        user_id: Uuid,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, AppError> {
        let kind = MediaKind::for_mime(mime_type).ok_or_else(|| NexusError::UnsupportedFileType {
            mime: mime_type.to_string(),
            expected: "image/* or application/pdf",
        })?;
        kind.validate(mime_type, bytes.len() as u64)?;

        tokio::fs::create_dir_all(self.root.join(user_id.to_string())).await?;

        let mut millis = Utc::now().timestamp_millis();
        let mut path = storage_path(user_id, mime_type, millis);
        while tokio::fs::try_exists(self.root.join(&path)).await? {
            millis += 1;
            path = storage_path(user_id, mime_type, millis);
        }

        tokio::fs::write(self.root.join(&path), bytes).await?;
        tracing::info!("Stored {} ({} bytes) at {}", file_name, bytes.len(), path);

        Ok(StoredFile {
            url: self.public_url(&path),
            path,
        })
    }

    /// Delete one of the user's files. Missing files are not an error.
    pub async fn delete(&self, user_id: Uuid, path: &str) -> Result<(), AppError> {
        let relative = owned_path(user_id, path)?;
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Check that `path` is a plain relative path inside the user's directory
fn owned_path(user_id: Uuid, path: &str) -> Result<PathBuf, AppError> {
    let relative = PathBuf::from(path);
    let mut components = relative.components();

    let owner = match components.next() {
        Some(Component::Normal(first)) => first.to_str() == Some(user_id.to_string().as_str()),
        _ => false,
    };
    let plain = components.all(|c| matches!(c, Component::Normal(_)));

    if !owner || !plain || relative.components().count() < 2 {
        return Err(AppError::BadRequest(format!("Invalid storage path '{}'", path)));
    }
    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> LocalStorage {
        let root = std::env::temp_dir().join(format!("nexusnote-storage-{}", Uuid::new_v4()));
        LocalStorage::new(root, "http://localhost:3000")
    }

    #[test]
    fn test_owned_path_rejects_traversal() {
        let user = Uuid::new_v4();
        assert!(owned_path(user, &format!("{}/1.png", user)).is_ok());
        assert!(owned_path(user, &format!("{}/../other/1.png", user)).is_err());
        assert!(owned_path(user, &format!("{}/1.png", Uuid::new_v4())).is_err());
        assert!(owned_path(user, "/etc/passwd").is_err());
        assert!(owned_path(user, &user.to_string()).is_err());
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let storage = temp_storage();
        let user = Uuid::new_v4();

        let first = storage
            .save(user, "scan.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .unwrap();
        let second = storage
            .save(user, "scan.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .unwrap();

        assert_ne!(first.path, second.path);
        assert!(first.path.starts_with(&user.to_string()));
        assert_eq!(first.url, format!("http://localhost:3000/files/{}", first.path));
        assert!(storage.root().join(&first.path).exists());

        storage.delete(user, &first.path).await.unwrap();
        assert!(!storage.root().join(&first.path).exists());
        // Deleting twice is fine
        storage.delete(user, &first.path).await.unwrap();

        let _ = std::fs::remove_dir_all(storage.root());
    }

    #[tokio::test]
    async fn test_extension_comes_from_mime_type() {
        let storage = temp_storage();
        let user = Uuid::new_v4();

        let stored = storage
            .save(user, "evil.html", "image/png", b"<script>alert(1)</script>")
            .await
            .unwrap();

        assert!(stored.path.ends_with(".png"));
        assert!(!stored.path.contains("html"));

        let _ = std::fs::remove_dir_all(storage.root());
    }

    #[tokio::test]
    async fn test_save_rejects_unsupported_type() {
        let storage = temp_storage();
        let err = storage
            .save(Uuid::new_v4(), "notes.txt", "text/plain", b"hi")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(NexusError::UnsupportedFileType { .. })
        ));
    }
}
