use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine;
use uuid::Uuid;

use crate::models::users::UploadedFile;

/// URL prefix under which stored files are served.
pub const MEDIA_URL: &str = "/media";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File {0} is not valid base64")]
    InvalidEncoding(String),
    #[error("File {0} is empty")]
    Empty(String),
    #[error("{0} is not a stored media path")]
    Foreign(String),
    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Where uploaded documents and media end up.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `file` under `folder` and return its public URL path.
    async fn save(&self, folder: &str, file: &UploadedFile) -> Result<String, StorageError>;

    /// Delete a file previously returned by `save`.
    async fn remove(&self, url: &str) -> Result<(), StorageError>;
}

/// Writes files below a local media root, served by `actix-files`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn save(&self, folder: &str, file: &UploadedFile) -> Result<String, StorageError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(file.content_base64.trim())
            .map_err(|_| StorageError::InvalidEncoding(file.filename.clone()))?;
        if bytes.is_empty() {
            return Err(StorageError::Empty(file.filename.clone()));
        }

        let name = format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(&file.filename));
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), bytes).await?;

        tracing::debug!(folder, file = %name, "stored upload");
        Ok(format!("{MEDIA_URL}/{folder}/{name}"))
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        let relative = url
            .strip_prefix(MEDIA_URL)
            .map(|r| r.trim_start_matches('/'))
            .filter(|r| !r.is_empty() && !r.split('/').any(|part| part == ".."))
            .ok_or_else(|| StorageError::Foreign(url.to_string()))?;
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tracing::debug!(%url, "removed upload");
        Ok(())
    }
}

/// Keep the final path component and replace anything unusual with `_`.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_base64: content.to_string(),
        }
    }

    #[test]
    fn sanitizes_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\my cert.pdf"), "my_cert.pdf");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[tokio::test]
    async fn saves_decoded_bytes_under_folder() {
        let root = std::env::temp_dir().join(format!("media-{}", Uuid::new_v4()));
        let storage = LocalStorage::new(&root);

        // "hello" in base64
        let url = storage
            .save("certificates", &upload("cert.txt", "aGVsbG8="))
            .await
            .unwrap();

        assert!(url.starts_with("/media/certificates/"));
        assert!(url.ends_with("_cert.txt"));
        let stored = root.join(url.trim_start_matches("/media/"));
        assert_eq!(tokio::fs::read(&stored).await.unwrap(), b"hello");

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn removes_saved_file_and_ignores_missing() {
        let root = std::env::temp_dir().join(format!("media-{}", Uuid::new_v4()));
        let storage = LocalStorage::new(&root);

        let url = storage
            .save("profiles", &upload("me.png", "aGVsbG8="))
            .await
            .unwrap();
        let stored = root.join(url.trim_start_matches("/media/"));
        assert!(stored.exists());

        storage.remove(&url).await.unwrap();
        assert!(!stored.exists());
        // already gone
        storage.remove(&url).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn remove_refuses_paths_outside_media() {
        let storage = LocalStorage::new(std::env::temp_dir());
        for url in ["/etc/passwd", "/media/../secret", "/media/"] {
            let err = storage.remove(url).await.unwrap_err();
            assert!(matches!(err, StorageError::Foreign(_)), "{url}");
        }
    }

    #[tokio::test]
    async fn rejects_invalid_base64() {
        let storage = LocalStorage::new(std::env::temp_dir());
        let err = storage
            .save("id_images", &upload("id.png", "not base64!!"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidEncoding(_)));
    }
}
