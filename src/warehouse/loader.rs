// ==========================================
// 忠诚度数据 ETL - 数仓装载器
// ==========================================
// 阶段 4: 重建 staging 表 → 批量装载清洗后文件 → 重建汇总表
// 每一步失败即中止（重试由调度方负责）
// 同一运行重复装载得到相同的汇总表
// ==========================================

use crate::config::BucketConfig;
use crate::domain::dataset::DatasetKind;
use crate::domain::run_context::RunContext;
use crate::storage::ObjectStorage;
use crate::warehouse::client::Warehouse;
use crate::warehouse::error::WarehouseResult;
use crate::warehouse::sql::{
    create_staging_table_sql, CREATE_SUMMARY_TABLE_SQL, POPULATE_SUMMARY_SQL, SUMMARY_TABLE,
};
use crate::warehouse::statement::WarehouseStatement;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub tables_created: usize,
    pub files_loaded: usize,
}

pub struct WarehouseLoader {
    warehouse: Arc<dyn Warehouse>,
    storage: Arc<dyn ObjectStorage>,
    buckets: BucketConfig,
}

impl WarehouseLoader {
    pub fn new(
        warehouse: Arc<dyn Warehouse>,
        storage: Arc<dyn ObjectStorage>,
        buckets: BucketConfig,
    ) -> Self {
        Self {
            warehouse,
            storage,
            buckets,
        }
    }

    #[instrument(skip_all, fields(run_id = %ctx.run_id))]
    pub async fn load(&self, ctx: &RunContext) -> WarehouseResult<LoadSummary> {
        let mut summary = LoadSummary::default();

        // 1. staging 表
        for kind in DatasetKind::ALL {
            self.warehouse
                .execute(&WarehouseStatement::sql(create_staging_table_sql(kind)))
                .await?;
            summary.tables_created += 1;
        }

        // 2. 批量装载
        let credentials = self.storage.temporary_credentials().await?;
        for kind in DatasetKind::ALL {
            for file in ctx.processed_files_of(kind) {
                let statement = WarehouseStatement::CopyInto {
                    table: kind.staging_table().to_string(),
                    bucket: self.buckets.processed.clone(),
                    key: file.path.clone(),
                    credentials: credentials.clone(),
                    skip_header: true,
                };
                info!(kind = %kind, statement = %statement, "装载清洗后文件");
                self.warehouse.execute(&statement).await?;
                summary.files_loaded += 1;
            }
        }

        // 3. 汇总表
        self.warehouse
            .execute(&WarehouseStatement::sql(CREATE_SUMMARY_TABLE_SQL))
            .await?;
        self.warehouse
            .execute(&WarehouseStatement::sql(POPULATE_SUMMARY_SQL))
            .await?;
        summary.tables_created += 1;

        info!(
            tables_created = summary.tables_created,
            files_loaded = summary.files_loaded,
            summary_table = SUMMARY_TABLE,
            "装载阶段完成"
        );
        Ok(summary)
    }
}
