// ==========================================
// 忠诚度数据 ETL - 记录分类器
// ==========================================
// 阶段 1: 抽取（sheet → 数据集 → 原始批次）
// 规则: 数据集所需列 ⊆ sheet 列集合 即匹配；按优先级取第一个
// 副作用: 每个批次落地为 CSV 并立即上传到 raw 区
// ==========================================

use crate::config::BucketConfig;
use crate::domain::artifact::{batch_file_name, FileReference, StorageArea};
use crate::domain::dataset::DatasetKind;
use crate::domain::record::{RawRecordBatch, Sheet, Workbook};
use crate::domain::run_context::RunContext;
use crate::importer::error::ImportResult;
use crate::importer::staging::write_staged_batch;
use crate::storage::{upload_artifact, ObjectStorage};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub struct RecordClassifier {
    storage: Arc<dyn ObjectStorage>,
    buckets: BucketConfig,
    raw_dir: PathBuf,
}

impl RecordClassifier {
    pub fn new(storage: Arc<dyn ObjectStorage>, buckets: BucketConfig, raw_dir: PathBuf) -> Self {
        Self {
            storage,
            buckets,
            raw_dir,
        }
    }

    /// 判定 sheet 所属数据集（无匹配返回 None）
    pub fn classify_sheet(sheet: &Sheet) -> Option<DatasetKind> {
        let columns = sheet.column_set();
        DatasetKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.required_columns().is_subset(&columns))
    }

    /// 按数据集汇总全部工作簿的原始批次
    ///
    /// 批次顺序 = 工作簿顺序 × sheet 顺序；未识别的 sheet 静默跳过
    pub fn classify(workbooks: &[Workbook]) -> BTreeMap<DatasetKind, Vec<RawRecordBatch>> {
        let mut grouped: BTreeMap<DatasetKind, Vec<RawRecordBatch>> = BTreeMap::new();

        for workbook in workbooks {
            for sheet in &workbook.sheets {
                let Some(kind) = Self::classify_sheet(sheet) else {
                    debug!(
                        source = %workbook.source.display(),
                        sheet = %sheet.name,
                        "sheet 未匹配任何数据集，跳过"
                    );
                    continue;
                };

                grouped.entry(kind).or_default().push(RawRecordBatch {
                    kind,
                    batch_id: Uuid::new_v4().to_string(),
                    source: format!("{}#{}", workbook.source.display(), sheet.name),
                    columns: sheet.columns.clone(),
                    rows: sheet.rows.clone(),
                });
            }
        }

        grouped
    }

    /// 分类 + 落地 + 上传 raw 区，登记到运行上下文
    ///
    /// # 返回
    /// 本次新增的原始批次数
    ///
    /// # 错误
    /// 任一批次落地或上传失败即中止（后续阶段依赖原始文件存在）
    #[instrument(skip_all, fields(run_id = %ctx.run_id))]
    pub async fn extract(
        &self,
        workbooks: &[Workbook],
        ctx: &mut RunContext,
    ) -> ImportResult<usize> {
        let grouped = Self::classify(workbooks);
        let mut staged = 0;

        for (kind, batches) in grouped {
            for batch in batches {
                let sequence = ctx.raw_count(kind) + 1;
                let path = self
                    .raw_dir
                    .join(batch_file_name(kind, &ctx.run_id, sequence));

                write_staged_batch(&batch, &path)?;
                let local = FileReference::local(kind, &path);
                upload_artifact(self.storage.as_ref(), &self.buckets, &local, StorageArea::Raw)
                    .await?;

                info!(
                    kind = %kind,
                    batch_id = %batch.batch_id,
                    source = %batch.source,
                    rows = batch.row_count(),
                    file = %local,
                    "原始批次已落地"
                );
                ctx.record_raw(local);
                staged += 1;
            }
        }

        Ok(staged)
    }
}
