// ==========================================
// 忠诚度数据 ETL - 数仓层
// ==========================================
// 职责: 数仓语句抽象、SQLite 实现、装载流程
// ==========================================

pub mod client;
pub mod error;
pub mod loader;
pub mod sql;
pub mod sqlite_warehouse;
pub mod statement;

pub use client::Warehouse;
pub use error::{WarehouseError, WarehouseResult};
pub use loader::{LoadSummary, WarehouseLoader};
pub use sql::SUMMARY_TABLE;
pub use sqlite_warehouse::SqliteWarehouse;
pub use statement::WarehouseStatement;
