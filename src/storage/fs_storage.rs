// ==========================================
// 忠诚度数据 ETL - 文件系统对象存储
// ==========================================
// 布局: <root>/<bucket>/<key>
// ==========================================

use crate::config::CredentialConfig;
use crate::storage::object_storage::{
    ObjectStorage, StorageError, StorageResult, TemporaryCredentials,
};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub struct FsObjectStorage {
    root: PathBuf,
    credentials: CredentialConfig,
}

impl FsObjectStorage {
    pub fn new(root: impl Into<PathBuf>, credentials: CredentialConfig) -> Self {
        Self {
            root: root.into(),
            credentials,
        }
    }

    /// 对象在文件系统中的位置
    pub fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        object_path(&self.root, bucket, key)
    }
}

/// 解析 `<root>/<bucket>/<key>`，拒绝越出桶目录的 key
pub fn object_path(root: &Path, bucket: &str, key: &str) -> StorageResult<PathBuf> {
    let relative = Path::new(key);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if key.is_empty() || escapes {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == ".." {
        return Err(StorageError::InvalidKey(format!("{}/{}", bucket, key)));
    }
    Ok(root.join(bucket).join(relative))
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    async fn put(
        &self,
        local_path: &Path,
        remote_key: &str,
        bucket: &str,
        overwrite: bool,
    ) -> StorageResult<()> {
        if !tokio::fs::try_exists(local_path).await? {
            return Err(StorageError::LocalFileNotFound(
                local_path.display().to_string(),
            ));
        }

        let target = self.object_path(bucket, remote_key)?;
        if !overwrite && tokio::fs::try_exists(&target).await? {
            return Err(StorageError::ObjectExists {
                bucket: bucket.to_string(),
                key: remote_key.to_string(),
            });
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = tokio::fs::copy(local_path, &target).await?;

        debug!(bucket, key = remote_key, bytes, "对象上传完成");
        Ok(())
    }

    async fn temporary_credentials(&self) -> StorageResult<TemporaryCredentials> {
        if self.credentials.access_key_id.is_empty() {
            // 本地存储无需鉴权，返回占位凭证
            return Ok(TemporaryCredentials {
                access_key_id: "local".to_string(),
                secret_access_key: "local".to_string(),
            });
        }
        Ok(TemporaryCredentials {
            access_key_id: self.credentials.access_key_id.clone(),
            secret_access_key: self.credentials.secret_access_key.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_put_copies_into_bucket_dir() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("a.csv");
        std::fs::File::create(&local)
            .unwrap()
            .write_all(b"x,y\n1,2\n")
            .unwrap();

        let storage = FsObjectStorage::new(dir.path().join("store"), CredentialConfig::default());
        storage
            .put(&local, "Purchases_Data_Set/a.csv", "processed", true)
            .await
            .unwrap();

        let stored = dir.path().join("store/processed/Purchases_Data_Set/a.csv");
        assert_eq!(std::fs::read_to_string(stored).unwrap(), "x,y\n1,2\n");
    }

    #[tokio::test]
    async fn test_put_without_overwrite_rejects_existing() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("a.csv");
        std::fs::write(&local, "x\n").unwrap();

        let storage = FsObjectStorage::new(dir.path().join("store"), CredentialConfig::default());
        storage.put(&local, "k/a.csv", "raw", false).await.unwrap();
        let second = storage.put(&local, "k/a.csv", "raw", false).await;

        assert!(matches!(second, Err(StorageError::ObjectExists { .. })));
    }

    #[tokio::test]
    async fn test_put_missing_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsObjectStorage::new(dir.path(), CredentialConfig::default());
        let result = storage
            .put(&dir.path().join("missing.csv"), "k/missing.csv", "raw", true)
            .await;

        assert!(matches!(result, Err(StorageError::LocalFileNotFound(_))));
    }

    #[test]
    fn test_object_path_rejects_traversal() {
        let root = Path::new("/store");
        assert!(object_path(root, "raw", "../etc/passwd").is_err());
        assert!(object_path(root, "raw", "/abs/key").is_err());
        assert!(object_path(root, "a/b", "k").is_err());
        assert_eq!(
            object_path(root, "raw", "Kind/file.csv").unwrap(),
            PathBuf::from("/store/raw/Kind/file.csv")
        );
    }

    #[tokio::test]
    async fn test_credentials_from_config() {
        let storage = FsObjectStorage::new(
            "/tmp",
            CredentialConfig {
                access_key_id: "id".to_string(),
                secret_access_key: "secret".to_string(),
            },
        );
        let creds = storage.temporary_credentials().await.unwrap();
        assert_eq!(creds.access_key_id, "id");
        assert_eq!(creds.secret_access_key, "secret");
    }
}
