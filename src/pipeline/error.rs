// ==========================================
// 忠诚度数据 ETL - 流水线错误类型
// ==========================================
// 汇总各层错误；任一阶段返回错误即中止本次运行
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use crate::quality::QualityError;
use crate::validator::ValidationError;
use crate::warehouse::WarehouseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("抽取阶段失败: {0}")]
    Import(#[from] ImportError),

    #[error("结构校验阶段失败: {0}")]
    Validation(#[from] ValidationError),

    #[error("清洗阶段失败: {0}")]
    Quality(#[from] QualityError),

    #[error("装载阶段失败: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("运行上下文读写失败 ({path}): {message}")]
    Context { path: String, message: String },

    #[error("后台任务异常: {0}")]
    Task(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
