// ==========================================
// 忠诚度数据 ETL - 数据质量错误类型
// ==========================================
// 说明: 行级规则失败不是错误（进入错误集）；
//       此处只描述批次级故障与 I/O 失败
// ==========================================

use crate::importer::ImportError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QualityError {
    // ===== 规则配置 =====
    #[error("规则正则无效 ({rule}): {message}")]
    InvalidPattern { rule: String, message: String },

    // ===== 批次级故障 =====
    #[error("批次缺少列: {0}")]
    MissingColumn(String),

    #[error("行宽度不符: 期望 {expected} 列，实际 {found} 列")]
    RowWidth { expected: usize, found: usize },

    #[error("值转换失败 ({column}): {message}")]
    Coercion { column: String, message: String },

    #[error("原始批次读取失败: {0}")]
    Import(#[from] ImportError),

    // ===== 产物写出 =====
    #[error("文件写入失败 ({path}): {message}")]
    FileWriteError { path: String, message: String },

    #[error("产物上传失败: {0}")]
    Storage(#[from] StorageError),
}

pub type QualityResult<T> = Result<T, QualityError>;
