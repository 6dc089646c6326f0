// ==========================================
// 忠诚度数据 ETL - 流水线层
// ==========================================
// 职责: 四阶段编排与运行上下文交接
// ==========================================

pub mod error;
pub mod runner;

pub use error::{PipelineError, PipelineResult};
pub use runner::{load_context, save_context, PipelineRunner, RunReport};
