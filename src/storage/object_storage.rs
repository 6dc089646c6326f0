// ==========================================
// 忠诚度数据 ETL - 对象存储接口
// ==========================================
// 职责: put / 临时凭证，两个操作即为核心流程对存储的全部依赖
// 实现者: FsObjectStorage（桶 = 本地目录）
// ==========================================

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("本地文件不存在: {0}")]
    LocalFileNotFound(String),

    #[error("对象 key 非法: {0}")]
    InvalidKey(String),

    #[error("对象已存在且不允许覆盖: {bucket}/{key}")]
    ObjectExists { bucket: String, key: String },

    #[error("存储 I/O 失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ==========================================
// TemporaryCredentials - 短期访问凭证
// ==========================================
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

// ==========================================
// ObjectStorage Trait
// ==========================================
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// 上传本地文件到指定桶
    ///
    /// # 参数
    /// - local_path: 本地文件路径
    /// - remote_key: 对象 key（`<Kind>/<file name>`）
    /// - bucket: 桶名
    /// - overwrite: 目标已存在时是否覆盖
    async fn put(
        &self,
        local_path: &Path,
        remote_key: &str,
        bucket: &str,
        overwrite: bool,
    ) -> StorageResult<()>;

    /// 获取短期访问凭证（供数仓批量加载使用）
    async fn temporary_credentials(&self) -> StorageResult<TemporaryCredentials>;
}
