// ==========================================
// 忠诚度数据 ETL - 导入层
// ==========================================
// 职责: 读取电子表格、按数据集分类、落地原始批次
// 支持: Excel (.xlsx/.xls)，落地格式 CSV
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod record_classifier;
pub mod staging;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{list_workbook_files, sheet_from_rows, ExcelParser, WorkbookParser};
pub use record_classifier::RecordClassifier;
pub use staging::{append_csv_records, read_staged_batch, write_staged_batch};
