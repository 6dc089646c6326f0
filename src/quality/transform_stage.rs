// ==========================================
// 忠诚度数据 ETL - 清洗阶段
// ==========================================
// 输入: RunContext.validated_files
// 输出: processed 区清洗后文件 + error 区数据质量错误日志
// 容错: 单批次故障记为 Failed 并继续，不阻断其他批次
// ==========================================

use crate::config::BucketConfig;
use crate::domain::artifact::{quality_error_file_name, FileReference, StorageArea};
use crate::domain::quality::BatchOutcome;
use crate::domain::run_context::RunContext;
use crate::importer::read_staged_batch;
use crate::quality::artifacts::append_quality_errors;
use crate::quality::error::QualityResult;
use crate::quality::transformer::QualityTransformer;
use crate::storage::{upload_artifact, ObjectStorage};
use futures::future::try_join_all;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformSummary {
    pub batches: usize,
    pub failed_batches: usize,
    pub clean_rows: usize,
    pub rejected_rows: usize,
    pub files_uploaded: usize,
}

pub struct TransformStage {
    storage: Arc<dyn ObjectStorage>,
    buckets: BucketConfig,
    transformer: QualityTransformer,
    processed_dir: PathBuf,
    errors_dir: PathBuf,
}

impl TransformStage {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        buckets: BucketConfig,
        transformer: QualityTransformer,
        processed_dir: PathBuf,
        errors_dir: PathBuf,
    ) -> Self {
        Self {
            storage,
            buckets,
            transformer,
            processed_dir,
            errors_dir,
        }
    }

    /// 清洗全部通过结构校验的批次并上传产物
    ///
    /// # 错误
    /// 仅上传失败会中止阶段；批次内故障体现在 `failed_batches`
    #[instrument(skip_all, fields(run_id = %ctx.run_id))]
    pub async fn run(&self, ctx: &mut RunContext) -> QualityResult<TransformSummary> {
        let mut summary = TransformSummary::default();
        let mut processed_local = Vec::new();
        let mut error_local: Vec<FileReference> = Vec::new();

        for batch_file in ctx.validated_files.clone() {
            summary.batches += 1;
            match self.process_batch(ctx, &batch_file) {
                BatchOutcome::Processed {
                    processed,
                    errors,
                    clean_rows,
                    rejected_rows,
                } => {
                    summary.clean_rows += clean_rows;
                    summary.rejected_rows += rejected_rows;
                    processed_local.push(processed);
                    if let Some(errors) = errors {
                        if !error_local.contains(&errors) {
                            error_local.push(errors);
                        }
                    }
                }
                BatchOutcome::Failed { batch_file, cause } => {
                    error!(file = %batch_file, cause = %cause, "批次清洗失败，跳过");
                    summary.failed_batches += 1;
                }
            }
        }

        // 并发上传（每个产物 key 唯一，互不冲突）
        let processed_uploads = processed_local.iter().map(|local| {
            upload_artifact(
                self.storage.as_ref(),
                &self.buckets,
                local,
                StorageArea::Processed,
            )
        });
        let error_uploads = error_local.iter().map(|local| {
            upload_artifact(self.storage.as_ref(), &self.buckets, local, StorageArea::Error)
        });
        let (processed_remote, error_remote) =
            futures::try_join!(try_join_all(processed_uploads), try_join_all(error_uploads))?;

        summary.files_uploaded = processed_remote.len() + error_remote.len();
        for remote in processed_remote {
            ctx.record_processed(remote);
        }
        for remote in error_remote {
            ctx.record_quality_error(remote);
        }

        info!(
            batches = summary.batches,
            failed = summary.failed_batches,
            clean_rows = summary.clean_rows,
            rejected_rows = summary.rejected_rows,
            files_uploaded = summary.files_uploaded,
            "清洗阶段完成"
        );
        Ok(summary)
    }

    /// 处理单个批次（故障转为 Failed，不向外传播）
    pub fn process_batch(&self, ctx: &RunContext, batch_file: &FileReference) -> BatchOutcome {
        match self.try_process_batch(ctx, batch_file) {
            Ok(outcome) => outcome,
            Err(e) => BatchOutcome::Failed {
                batch_file: batch_file.clone(),
                cause: e.to_string(),
            },
        }
    }

    fn try_process_batch(
        &self,
        ctx: &RunContext,
        batch_file: &FileReference,
    ) -> QualityResult<BatchOutcome> {
        let kind = batch_file.kind;
        let batch = read_staged_batch(&batch_file.local_path(), kind)?;
        let result = self.transformer.transform_batch(&batch)?;

        // 清洗后文件沿用原始批次文件名（含批次序号）
        let processed_path = self.processed_dir.join(batch_file.file_name());
        let clean_rows = result.write_processed(&processed_path)?;

        let rejected_rows = result.errors().len();
        let errors = if rejected_rows == 0 {
            None
        } else {
            let path = self
                .errors_dir
                .join(quality_error_file_name(kind, &ctx.run_id));
            append_quality_errors(result.kind(), result.errors(), &path)?;
            Some(FileReference::local(kind, &path))
        };

        info!(
            kind = %kind,
            batch_id = %batch.batch_id,
            clean_rows,
            rejected_rows,
            duplicates_dropped = result.duplicates_dropped(),
            "批次清洗完成"
        );

        Ok(BatchOutcome::Processed {
            processed: FileReference::local(kind, &processed_path),
            errors,
            clean_rows,
            rejected_rows,
        })
    }
}
