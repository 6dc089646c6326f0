// ==========================================
// 忠诚度数据 ETL - 数据质量结果模型
// ==========================================
// 职责: ProcessedBatch（clean + errors 分区）与批次处理结果
// 红线: 同一行不能同时出现在 clean 与 errors 中
// ==========================================

use crate::domain::artifact::FileReference;
use crate::domain::record::RawRow;
use serde::{Deserialize, Serialize};

// ==========================================
// RejectedRow - 被规则拒绝的行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub row: RawRow,   // 原始值（按 schema 列顺序）
    pub rule: String,  // 拒绝该行的规则名
}

// ==========================================
// ProcessedBatch - 清洗结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedBatch<R> {
    pub clean: Vec<R>,
    pub errors: Vec<RejectedRow>,
    pub duplicates_dropped: usize,
}

impl<R> ProcessedBatch<R> {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 某条规则拒绝的行数
    pub fn rejected_by(&self, rule: &str) -> usize {
        self.errors.iter().filter(|e| e.rule == rule).count()
    }
}

// ==========================================
// BatchOutcome - 单批次处理结果
// ==========================================
// 用途: 批次级故障以值的形式返回，外层循环汇总而不中断
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Processed {
        processed: FileReference,      // 本地清洗后文件
        errors: Option<FileReference>, // 本地错误日志（有错误行时）
        clean_rows: usize,
        rejected_rows: usize,
    },
    Failed {
        batch_file: FileReference,
        cause: String,
    },
}
