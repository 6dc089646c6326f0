// ==========================================
// 忠诚度数据 ETL - 存储层
// ==========================================
// 职责: 对象存储接口与实现，产物上传辅助
// ==========================================

pub mod fs_storage;
pub mod object_storage;

pub use fs_storage::FsObjectStorage;
pub use object_storage::{ObjectStorage, StorageError, StorageResult, TemporaryCredentials};

use crate::config::BucketConfig;
use crate::domain::artifact::{remote_key, FileReference, StorageArea};

/// 将本地产物上传到指定存储区，返回远端引用
///
/// key 规则: `<Kind>/<本地文件名>`，总是覆盖
pub async fn upload_artifact(
    storage: &dyn ObjectStorage,
    buckets: &BucketConfig,
    local: &FileReference,
    area: StorageArea,
) -> StorageResult<FileReference> {
    let bucket = buckets
        .bucket_for(area)
        .ok_or_else(|| StorageError::InvalidKey(format!("存储区 {} 无对应桶", area)))?;
    let key = remote_key(local.kind, local.file_name());

    storage.put(&local.local_path(), &key, bucket, true).await?;
    tracing::info!(bucket, key = %key, "产物已上传");

    Ok(FileReference::remote(local.kind, area, key))
}
