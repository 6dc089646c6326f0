// ==========================================
// 忠诚度数据 ETL - 核心库
// ==========================================
// 流程: 抽取(分类) → 结构校验 → 数据质量清洗 → 入仓汇总
// 技术栈: calamine + csv + SQLite + tokio
// 系统定位: 批处理 ETL（调度与重试由外部负责）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 数据集、记录、产物引用、运行上下文
pub mod domain;

// 导入层 - 工作簿解析与分类落地
pub mod importer;

// 结构校验层
pub mod validator;

// 数据质量层
pub mod quality;

// 存储层 - 对象存储
pub mod storage;

// 数仓层
pub mod warehouse;

// 流水线编排
pub mod pipeline;

// 配置层
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    BatchOutcome, DatasetKind, FileReference, ProcessedBatch, RawRecordBatch, RejectedRow,
    RunContext, RunId, Schema, StorageArea,
};

// 各阶段组件
pub use importer::RecordClassifier;
pub use quality::{QualityRule, QualityTransformer};
pub use validator::{SchemaValidator, ValidationResult};
pub use warehouse::{Warehouse, WarehouseLoader};

// 编排
pub use config::PipelineConfig;
pub use pipeline::{PipelineError, PipelineRunner, RunReport};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "忠诚度数据 ETL";
