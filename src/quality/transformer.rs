// ==========================================
// 忠诚度数据 ETL - 数据质量转换器
// ==========================================
// 阶段 3 核心: 批次 → 清洁记录 + 错误集
// 顺序: 缺失值 → 强类型草稿 → 规则表（逐条，首个失败规则定标签）→ 去重
// 错误集按步骤拼接，步骤内保持行顺序
// ==========================================

use crate::config::QualityConfig;
use crate::domain::dataset::{DatasetKind, Schema};
use crate::domain::quality::{ProcessedBatch, RejectedRow};
use crate::domain::record::{LoyaltyEarnedHourlyRecord, PurchaseRecord, RawRecordBatch, RawRow};
use crate::quality::artifacts::write_processed;
use crate::quality::error::{QualityError, QualityResult};
use crate::quality::records::{DatasetRecord, LoyaltyEarnedHourlyDraft, PurchaseDraft};
use crate::quality::rules::{QualityRule, MISSING_VALUE};
use crate::quality::rulesets::{loyalty_ruleset, purchase_ruleset};
use std::collections::HashSet;
use std::path::Path;

// ==========================================
// CleanBatch - 按数据集区分的清洗结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CleanBatch {
    LoyaltyEarnedHourly(ProcessedBatch<LoyaltyEarnedHourlyRecord>),
    Purchases(ProcessedBatch<PurchaseRecord>),
}

impl CleanBatch {
    pub fn kind(&self) -> DatasetKind {
        match self {
            CleanBatch::LoyaltyEarnedHourly(_) => DatasetKind::LoyaltyEarnedHourly,
            CleanBatch::Purchases(_) => DatasetKind::Purchases,
        }
    }

    pub fn errors(&self) -> &[RejectedRow] {
        match self {
            CleanBatch::LoyaltyEarnedHourly(b) => &b.errors,
            CleanBatch::Purchases(b) => &b.errors,
        }
    }

    pub fn duplicates_dropped(&self) -> usize {
        match self {
            CleanBatch::LoyaltyEarnedHourly(b) => b.duplicates_dropped,
            CleanBatch::Purchases(b) => b.duplicates_dropped,
        }
    }

    /// 写出清洗后文件，返回记录数
    pub fn write_processed(&self, path: &Path) -> QualityResult<usize> {
        match self {
            CleanBatch::LoyaltyEarnedHourly(b) => write_processed(&b.clean, path),
            CleanBatch::Purchases(b) => write_processed(&b.clean, path),
        }
    }
}

pub struct QualityTransformer {
    config: QualityConfig,
    loyalty_rules: Vec<QualityRule<LoyaltyEarnedHourlyDraft>>,
    purchase_rules: Vec<QualityRule<PurchaseDraft>>,
}

impl QualityTransformer {
    pub fn new(config: &QualityConfig) -> QualityResult<Self> {
        Ok(Self {
            config: config.clone(),
            loyalty_rules: loyalty_ruleset(config)?,
            purchase_rules: purchase_ruleset(config)?,
        })
    }

    /// 按批次所属数据集的规则表处理
    pub fn transform_batch(&self, batch: &RawRecordBatch) -> QualityResult<CleanBatch> {
        match batch.kind {
            DatasetKind::LoyaltyEarnedHourly => {
                transform::<LoyaltyEarnedHourlyRecord>(batch, &self.loyalty_rules, &self.config)
                    .map(CleanBatch::LoyaltyEarnedHourly)
            }
            DatasetKind::Purchases => {
                transform::<PurchaseRecord>(batch, &self.purchase_rules, &self.config)
                    .map(CleanBatch::Purchases)
            }
        }
    }
}

/// 对批次应用规则序列
///
/// 每个被拒绝的行只出现在错误集一次，且不出现在清洁集中
pub fn transform<R: DatasetRecord>(
    batch: &RawRecordBatch,
    rules: &[QualityRule<R::Draft>],
    config: &QualityConfig,
) -> QualityResult<ProcessedBatch<R>> {
    let projected = project_rows(batch, R::KIND.schema())?;

    let mut errors = Vec::new();

    // 1. 缺失值
    let mut pending: Vec<(RawRow, R::Draft)> = Vec::with_capacity(projected.len());
    for row in projected {
        if row.has_missing() {
            errors.push(RejectedRow {
                row,
                rule: MISSING_VALUE.to_string(),
            });
            continue;
        }
        let values = row.cells.iter().flatten().cloned().collect();
        let draft = R::draft(values, config)?;
        pending.push((row, draft));
    }

    // 2. 格式/取值/数值规则
    for rule in rules {
        let mut survivors = Vec::with_capacity(pending.len());
        for (row, draft) in pending {
            if rule.passes(&draft) {
                survivors.push((row, draft));
            } else {
                errors.push(RejectedRow {
                    row,
                    rule: rule.name.to_string(),
                });
            }
        }
        pending = survivors;
    }

    // 3. 去重（保留首次出现，不计入错误）
    let mut seen = HashSet::new();
    let mut clean = Vec::with_capacity(pending.len());
    let mut duplicates_dropped = 0;
    for (_, draft) in pending {
        let record = R::finish(draft)?;
        if seen.insert(record.to_row()) {
            clean.push(record);
        } else {
            duplicates_dropped += 1;
        }
    }

    Ok(ProcessedBatch {
        clean,
        errors,
        duplicates_dropped,
    })
}

/// 将批次行投影为 schema 列顺序（多余列丢弃）
fn project_rows(batch: &RawRecordBatch, schema: &Schema) -> QualityResult<Vec<RawRow>> {
    let positions = schema
        .column_names()
        .map(|name| {
            batch
                .column_index(name)
                .ok_or_else(|| QualityError::MissingColumn(name.to_string()))
        })
        .collect::<QualityResult<Vec<_>>>()?;

    Ok(batch
        .rows
        .iter()
        .map(|row| {
            let cells = positions
                .iter()
                .map(|idx| row.cells.get(*idx).cloned().flatten())
                .collect();
            RawRow::new(row.row_number, cells)
        })
        .collect())
}
