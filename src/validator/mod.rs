// ==========================================
// 忠诚度数据 ETL - 结构校验层
// ==========================================
// 职责: 原始批次结构闸门 + 结构错误日志
// 粒度: 批次（与清洗层的行级粒度相对）
// ==========================================

pub mod error;
pub mod schema_validator;
pub mod validation_stage;

pub use error::{ValidationError, ValidatorResult};
pub use schema_validator::{SchemaValidator, ValidationResult};
pub use validation_stage::{ValidationStage, ValidationSummary, SCHEMA_ERROR_HEADER};
