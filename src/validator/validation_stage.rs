// ==========================================
// 忠诚度数据 ETL - 结构校验阶段
// ==========================================
// 输入: RunContext.raw_files（本地落地的原始批次）
// 输出: 通过 → validated_files；拒绝 → 错误日志 + 原始文件进入 error 区
// ==========================================

use crate::config::BucketConfig;
use crate::domain::artifact::{schema_error_file_name, FileReference, StorageArea};
use crate::domain::run_context::RunContext;
use crate::importer::{append_csv_records, read_staged_batch};
use crate::storage::{upload_artifact, ObjectStorage};
use crate::validator::error::{ValidationError, ValidatorResult};
use crate::validator::schema_validator::{SchemaValidator, ValidationResult};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 结构错误日志表头
pub const SCHEMA_ERROR_HEADER: &[&str] = &["error"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub valid_batches: usize,
    pub invalid_batches: usize,
}

pub struct ValidationStage {
    storage: Arc<dyn ObjectStorage>,
    buckets: BucketConfig,
    errors_dir: PathBuf,
}

impl ValidationStage {
    pub fn new(storage: Arc<dyn ObjectStorage>, buckets: BucketConfig, errors_dir: PathBuf) -> Self {
        Self {
            storage,
            buckets,
            errors_dir,
        }
    }

    /// 逐个原始批次做结构校验
    ///
    /// 被拒绝的批次不会进入清洗阶段；其余批次不受影响
    #[instrument(skip_all, fields(run_id = %ctx.run_id))]
    pub async fn run(&self, ctx: &mut RunContext) -> ValidatorResult<ValidationSummary> {
        let mut summary = ValidationSummary::default();
        let raw_files = ctx.raw_files.clone();

        for raw in raw_files {
            let batch = read_staged_batch(&raw.local_path(), raw.kind)?;

            match SchemaValidator::validate(&batch, raw.kind.schema()) {
                ValidationResult::Valid => {
                    info!(kind = %raw.kind, file = %raw, rows = batch.row_count(), "结构校验通过");
                    ctx.record_validated(raw);
                    summary.valid_batches += 1;
                }
                ValidationResult::Invalid(errors) => {
                    warn!(
                        kind = %raw.kind,
                        file = %raw,
                        errors = ?errors,
                        "结构校验失败，整批隔离"
                    );
                    let sink = self.write_errors(ctx, &raw, errors)?;
                    let remote_sink = upload_artifact(
                        self.storage.as_ref(),
                        &self.buckets,
                        &sink,
                        StorageArea::Error,
                    )
                    .await?;
                    // 被拒绝的原始文件本身也进入 error 区
                    upload_artifact(self.storage.as_ref(), &self.buckets, &raw, StorageArea::Error)
                        .await?;

                    ctx.record_schema_error(remote_sink);
                    summary.invalid_batches += 1;
                }
            }
        }

        info!(
            valid = summary.valid_batches,
            invalid = summary.invalid_batches,
            "结构校验阶段完成"
        );
        Ok(summary)
    }

    fn write_errors(
        &self,
        ctx: &RunContext,
        raw: &FileReference,
        errors: Vec<String>,
    ) -> ValidatorResult<FileReference> {
        let path = self
            .errors_dir
            .join(schema_error_file_name(raw.kind, &ctx.run_id));

        append_csv_records(&path, SCHEMA_ERROR_HEADER, errors.into_iter().map(|e| vec![e]))
            .map_err(|e| ValidationError::SinkWriteError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(FileReference::local(raw.kind, &path))
    }
}
