// ==========================================
// 忠诚度数据 ETL - 结构校验错误类型
// ==========================================

use crate::importer::ImportError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("原始批次读取失败: {0}")]
    Import(#[from] ImportError),

    #[error("结构错误日志写入失败 ({path}): {message}")]
    SinkWriteError { path: String, message: String },

    #[error("错误文件上传失败: {0}")]
    Storage(#[from] StorageError),
}

pub type ValidatorResult<T> = Result<T, ValidationError>;
