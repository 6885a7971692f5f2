//! Object storage for raw source files.
//!
//! Documents reference their raw file by a locator string (`file_s3`). The store only
//! has to put bytes under a key and hand them back; no listing or lifecycle rules.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::AppError;

/// Key/value blob store behind the file routes and the health check.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key`, replacing any previous object.
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), AppError>;

    /// Fetch the bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError>;

    async fn exists(&self, key: &str) -> Result<bool, AppError>;

    /// Reachability probe.
    async fn check(&self) -> Result<(), AppError>;

    /// Reference string recorded on documents for an object.
    fn locator(&self, key: &str) -> String;
}

/// Reject keys that are empty or could escape the bucket directory.
pub fn validate_key(key: &str) -> Result<(), AppError> {
    if key.is_empty() {
        return Err(AppError::Validation("Object key is required".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(AppError::Validation(format!(
            "Object key must be a relative path: {}",
            key
        )));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(AppError::Validation(format!(
            "Object key has an empty or relative segment: {}",
            key
        )));
    }
    Ok(())
}

/// Filesystem-backed store: one directory per bucket under a root path.
pub struct FilesystemStore {
    bucket: String,
    bucket_path: PathBuf,
}

impl FilesystemStore {
    /// Open the bucket directory, creating it if missing.
    pub async fn open(root: &Path, bucket: &str) -> Result<Self, AppError> {
        validate_key(bucket)?;
        let bucket_path = root.join(bucket);
        if !fs::try_exists(&bucket_path).await? {
            fs::create_dir_all(&bucket_path).await?;
            tracing::info!("Created bucket: {}", bucket);
        }
        Ok(Self {
            bucket: bucket.to_string(),
            bucket_path,
        })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, AppError> {
        validate_key(key)?;
        Ok(self.bucket_path.join(key))
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), AppError> {
        let path = self.object_path(key)?;
        tracing::debug!(key, size = data.len(), "object_store: put");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a sibling temp file, then rename over the target
        let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(format!(".{}.tmp", uuid::Uuid::new_v4()));
        let temp_path = path.with_file_name(temp_name);

        let mut file = fs::File::create(&temp_path).await?;
        if let Err(e) = file.write_all(data).await {
            drop(file);
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let path = self.object_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Object {} not found", key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let path = self.object_path(key)?;
        Ok(fs::try_exists(&path).await? && fs::metadata(&path).await?.is_file())
    }

    async fn check(&self) -> Result<(), AppError> {
        let metadata = fs::metadata(&self.bucket_path).await?;
        if !metadata.is_dir() {
            return Err(AppError::Storage(format!(
                "Bucket path is not a directory: {}",
                self.bucket_path.display()
            )));
        }
        Ok(())
    }

    fn locator(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}
