// ==========================================
// 忠诚度数据 ETL - 流水线编排
// ==========================================
// 顺序: extract → validate → transform → load
// 阶段间只通过 RunContext 交接（进程内传引用，跨进程序列化为 JSON）
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::record::Workbook;
use crate::domain::run_context::{RunContext, RunId};
use crate::importer::{list_workbook_files, ExcelParser, RecordClassifier, WorkbookParser};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::quality::{QualityTransformer, TransformStage, TransformSummary};
use crate::storage::{FsObjectStorage, ObjectStorage};
use crate::validator::{ValidationStage, ValidationSummary};
use crate::warehouse::{LoadSummary, SqliteWarehouse, Warehouse, WarehouseLoader};
use futures::future::join_all;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// 一次完整运行的汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub extracted_batches: usize,
    pub validation: ValidationSummary,
    pub transform: TransformSummary,
    pub load: LoadSummary,
}

pub struct PipelineRunner {
    config: PipelineConfig,
    classifier: RecordClassifier,
    validation_stage: ValidationStage,
    transform_stage: TransformStage,
    loader: WarehouseLoader,
}

impl PipelineRunner {
    /// 以给定的存储与数仓实现构造
    pub fn new(
        config: PipelineConfig,
        storage: Arc<dyn ObjectStorage>,
        warehouse: Arc<dyn Warehouse>,
    ) -> PipelineResult<Self> {
        let work_dir = &config.work_dir;
        let transformer = QualityTransformer::new(&config.quality)?;

        Ok(Self {
            classifier: RecordClassifier::new(
                Arc::clone(&storage),
                config.buckets.clone(),
                work_dir.join("raw"),
            ),
            validation_stage: ValidationStage::new(
                Arc::clone(&storage),
                config.buckets.clone(),
                work_dir.join("errors"),
            ),
            transform_stage: TransformStage::new(
                Arc::clone(&storage),
                config.buckets.clone(),
                transformer,
                work_dir.join("processed"),
                work_dir.join("errors"),
            ),
            loader: WarehouseLoader::new(warehouse, storage, config.buckets.clone()),
            config,
        })
    }

    /// 按配置构造（文件系统对象存储 + SQLite 数仓）
    pub fn from_config(config: PipelineConfig) -> PipelineResult<Self> {
        let storage = Arc::new(FsObjectStorage::new(
            &config.object_store_root,
            config.credentials.clone(),
        ));
        let warehouse = Arc::new(SqliteWarehouse::open(
            &config.warehouse_db_path,
            &config.object_store_root,
        )?);
        Self::new(config, storage, warehouse)
    }

    /// 新运行上下文（运行标识取当前时间）
    pub fn start_run(&self) -> RunContext {
        RunContext::new(RunId::now())
    }

    /// 抽取: 解析输入目录下全部工作簿并分类落地
    #[instrument(skip_all, fields(input_dir = %self.config.input_dir.display()))]
    pub async fn extract(&self, ctx: &mut RunContext) -> PipelineResult<usize> {
        let files = list_workbook_files(&self.config.input_dir)?;
        info!(count = files.len(), "发现源文件");

        // 各文件并发解析，结果保持文件顺序
        let parse_tasks = files.into_iter().map(|path| {
            tokio::task::spawn_blocking(move || ExcelParser.parse_workbook(&path))
        });
        let mut workbooks = Vec::new();
        for result in join_all(parse_tasks).await {
            let workbook = result.map_err(|e| PipelineError::Task(e.to_string()))??;
            workbooks.push(workbook);
        }

        self.extract_workbooks(&workbooks, ctx).await
    }

    /// 抽取: 基于已解析的工作簿
    pub async fn extract_workbooks(
        &self,
        workbooks: &[Workbook],
        ctx: &mut RunContext,
    ) -> PipelineResult<usize> {
        let staged = self.classifier.extract(workbooks, ctx).await?;
        info!(run_id = %ctx.run_id, batches = staged, "抽取阶段完成");
        Ok(staged)
    }

    pub async fn validate(&self, ctx: &mut RunContext) -> PipelineResult<ValidationSummary> {
        Ok(self.validation_stage.run(ctx).await?)
    }

    pub async fn transform(&self, ctx: &mut RunContext) -> PipelineResult<TransformSummary> {
        Ok(self.transform_stage.run(ctx).await?)
    }

    pub async fn load(&self, ctx: &RunContext) -> PipelineResult<LoadSummary> {
        Ok(self.loader.load(ctx).await?)
    }

    /// 完整运行四个阶段
    pub async fn run(&self) -> PipelineResult<RunReport> {
        let mut ctx = self.start_run();
        let extracted_batches = self.extract(&mut ctx).await?;
        self.finish(ctx, extracted_batches).await
    }

    /// 完整运行四个阶段（输入为已解析的工作簿）
    pub async fn run_workbooks(&self, workbooks: &[Workbook]) -> PipelineResult<RunReport> {
        let mut ctx = self.start_run();
        let extracted_batches = self.extract_workbooks(workbooks, &mut ctx).await?;
        self.finish(ctx, extracted_batches).await
    }

    async fn finish(
        &self,
        mut ctx: RunContext,
        extracted_batches: usize,
    ) -> PipelineResult<RunReport> {
        let validation = self.validate(&mut ctx).await?;
        let transform = self.transform(&mut ctx).await?;
        let load = self.load(&ctx).await?;

        let report = RunReport {
            run_id: ctx.run_id.clone(),
            extracted_batches,
            validation,
            transform,
            load,
        };
        info!(
            run_id = %report.run_id,
            batches = report.extracted_batches,
            invalid_batches = report.validation.invalid_batches,
            failed_batches = report.transform.failed_batches,
            clean_rows = report.transform.clean_rows,
            rejected_rows = report.transform.rejected_rows,
            files_loaded = report.load.files_loaded,
            "运行完成"
        );
        Ok(report)
    }
}

/// 保存运行上下文（JSON，阶段分进程运行时的交接方式）
pub fn save_context(ctx: &RunContext, path: &Path) -> PipelineResult<()> {
    let file = File::create(path).map_err(|e| context_error(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), ctx).map_err(|e| context_error(path, e))
}

/// 读取运行上下文
pub fn load_context(path: &Path) -> PipelineResult<RunContext> {
    let file = File::open(path).map_err(|e| context_error(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| context_error(path, e))
}

fn context_error(path: &Path, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Context {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetKind, FileReference};

    #[test]
    fn test_context_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_context.json");

        let mut ctx = RunContext::new(RunId::from("2024-01-01-00-00-00"));
        ctx.record_raw(FileReference::local(
            DatasetKind::LoyaltyEarnedHourly,
            Path::new("raw/leh.csv"),
        ));
        save_context(&ctx, &path).unwrap();

        let loaded = load_context(&path).unwrap();
        assert_eq!(loaded, ctx);
        assert_eq!(loaded.raw_count(DatasetKind::LoyaltyEarnedHourly), 1);
        assert_eq!(loaded.raw_count(DatasetKind::Purchases), 0);
    }

    #[test]
    fn test_load_context_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_context.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            load_context(&path),
            Err(PipelineError::Context { .. })
        ));
    }

    #[test]
    fn test_load_context_missing_file() {
        let result = load_context(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(PipelineError::Context { .. })));
    }

    #[tokio::test]
    async fn test_extract_missing_input_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            input_dir: dir.path().join("absent"),
            work_dir: dir.path().join("work"),
            object_store_root: dir.path().join("store"),
            warehouse_db_path: dir.path().join("warehouse.db"),
            ..PipelineConfig::default()
        };
        let runner = PipelineRunner::from_config(config).unwrap();
        let mut ctx = runner.start_run();

        let result = runner.extract(&mut ctx).await;
        assert!(matches!(result, Err(PipelineError::Import(_))));
    }
}
