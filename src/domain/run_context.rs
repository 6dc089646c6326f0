// ==========================================
// 忠诚度数据 ETL - 运行上下文
// ==========================================
// 职责: 一次流水线运行的 RunId + 各阶段产物引用列表
// 生命周期: 抽取开始时创建 → 各阶段追加 → 入仓完成后丢弃
// 红线: 阶段内只追加；交给下一阶段后只读
// ==========================================

use crate::domain::artifact::FileReference;
use crate::domain::dataset::DatasetKind;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// RunId - 运行标识（时间戳派生）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn from_time(now: DateTime<Local>) -> Self {
        Self(now.format("%Y-%m-%d-%H-%M-%S").to_string())
    }

    pub fn now() -> Self {
        Self::from_time(Local::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ==========================================
// RunContext
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: RunId,
    pub raw_files: Vec<FileReference>,           // 本地落地的原始批次
    pub validated_files: Vec<FileReference>,     // 通过结构校验的原始批次
    pub schema_error_files: Vec<FileReference>,  // 结构校验错误日志（error 区）
    pub processed_files: Vec<FileReference>,     // 清洗后文件（processed 区）
    pub quality_error_files: Vec<FileReference>, // 数据质量错误日志（error 区）
}

impl RunContext {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            raw_files: Vec::new(),
            validated_files: Vec::new(),
            schema_error_files: Vec::new(),
            processed_files: Vec::new(),
            quality_error_files: Vec::new(),
        }
    }

    /// 该类型已落地的原始批次数（用于生成下一个序号）
    pub fn raw_count(&self, kind: DatasetKind) -> usize {
        self.raw_files.iter().filter(|f| f.kind == kind).count()
    }

    pub fn processed_files_of(&self, kind: DatasetKind) -> impl Iterator<Item = &FileReference> {
        self.processed_files.iter().filter(move |f| f.kind == kind)
    }

    pub fn record_raw(&mut self, file: FileReference) {
        self.raw_files.push(file);
    }

    pub fn record_validated(&mut self, file: FileReference) {
        self.validated_files.push(file);
    }

    pub fn record_processed(&mut self, file: FileReference) {
        self.processed_files.push(file);
    }

    // 错误日志按运行追加写入，同一文件只登记一次
    pub fn record_schema_error(&mut self, file: FileReference) {
        push_unique(&mut self.schema_error_files, file);
    }

    pub fn record_quality_error(&mut self, file: FileReference) {
        push_unique(&mut self.quality_error_files, file);
    }
}

fn push_unique(list: &mut Vec<FileReference>, file: FileReference) {
    if !list.contains(&file) {
        list.push(file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::StorageArea;
    use chrono::TimeZone;

    #[test]
    fn test_run_id_format() {
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(RunId::from_time(now).as_str(), "2024-01-02-03-04-05");
    }

    #[test]
    fn test_error_files_registered_once() {
        let mut ctx = RunContext::new(RunId::from("r1"));
        let file = FileReference::remote(
            DatasetKind::Purchases,
            StorageArea::Error,
            "Purchases_Data_Set/errors_dq_purchases_r1.csv",
        );
        ctx.record_quality_error(file.clone());
        ctx.record_quality_error(file);

        assert_eq!(ctx.quality_error_files.len(), 1);
    }
}
