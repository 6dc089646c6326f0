// ==========================================
// 忠诚度数据 ETL - 数仓接口
// ==========================================
// 核心流程对数仓的唯一依赖: 执行一条语句
// 实现者: SqliteWarehouse
// ==========================================

use crate::warehouse::error::WarehouseResult;
use crate::warehouse::statement::WarehouseStatement;
use async_trait::async_trait;

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// 执行语句（DDL / 批量装载 / 汇总查询）
    async fn execute(&self, statement: &WarehouseStatement) -> WarehouseResult<()>;
}
