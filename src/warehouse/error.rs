// ==========================================
// 忠诚度数据 ETL - 数仓层错误类型
// ==========================================

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("非法标识符: {0}")]
    InvalidIdentifier(String),

    #[error("装载源文件读取失败 ({path}): {message}")]
    SourceReadError { path: String, message: String },

    #[error("数仓后台任务失败: {0}")]
    Task(String),

    #[error("数仓文件 I/O 失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("存储访问失败: {0}")]
    Storage(#[from] StorageError),
}

pub type WarehouseResult<T> = Result<T, WarehouseError>;
