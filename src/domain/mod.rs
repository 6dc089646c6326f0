// ==========================================
// 忠诚度数据 ETL - 领域模型层
// ==========================================
// 职责: 定义数据集、记录、产物引用、运行上下文
// 红线: 不含 I/O 逻辑,不含规则执行逻辑
// ==========================================

pub mod artifact;
pub mod dataset;
pub mod quality;
pub mod record;
pub mod run_context;

// 重导出核心类型
pub use artifact::{FileReference, StorageArea};
pub use dataset::{ColumnSpec, ColumnType, DatasetKind, Schema, TIMESTAMP_FORMAT};
pub use quality::{BatchOutcome, ProcessedBatch, RejectedRow};
pub use record::{
    LoyaltyEarnedHourlyRecord, PurchaseRecord, RawRecordBatch, RawRow, Sheet, Workbook,
};
pub use run_context::{RunContext, RunId};
