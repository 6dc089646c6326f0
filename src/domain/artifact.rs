// ==========================================
// 忠诚度数据 ETL - 产物引用与命名规则
// ==========================================
// 职责: FileReference（本地/对象存储产物的逻辑引用）+ 文件命名约定
// 红线: 命名规则需与下游保持逐字节兼容
// ==========================================

use crate::domain::dataset::DatasetKind;
use crate::domain::run_context::RunId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ==========================================
// StorageArea - 存储位置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageArea {
    Local,     // 本地落地目录
    Landing,   // 着陆区（核心流程不直接使用）
    Raw,       // 原始数据区
    Error,     // 错误数据区（隔离区）
    Processed, // 清洗后数据区
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageArea::Local => "local",
            StorageArea::Landing => "landing",
            StorageArea::Raw => "raw",
            StorageArea::Error => "error",
            StorageArea::Processed => "processed",
        };
        f.write_str(name)
    }
}

// ==========================================
// FileReference - 产物引用（创建后不可变）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileReference {
    pub kind: DatasetKind,
    pub area: StorageArea,
    pub path: String, // Local: 本地路径；其他: 对象 key
}

impl FileReference {
    pub fn local(kind: DatasetKind, path: &Path) -> Self {
        Self {
            kind,
            area: StorageArea::Local,
            path: path.display().to_string(),
        }
    }

    pub fn remote(kind: DatasetKind, area: StorageArea, key: impl Into<String>) -> Self {
        Self {
            kind,
            area,
            path: key.into(),
        }
    }

    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    /// 文件名部分（本地路径或对象 key 的最后一段）
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.area, self.path)
    }
}

// ==========================================
// 命名规则
// ==========================================

/// 原始/清洗后文件名: `<Kind>_<RunId>.csv`
///
/// 同一运行中同类型的第 2 个及以后批次追加序号 `_<n>`
pub fn batch_file_name(kind: DatasetKind, run_id: &RunId, sequence: usize) -> String {
    if sequence <= 1 {
        format!("{}_{}.csv", kind.file_stem(), run_id)
    } else {
        format!("{}_{}_{}.csv", kind.file_stem(), run_id, sequence)
    }
}

/// 结构校验错误日志: `error_sv_<kind>_<RunId>.csv`
pub fn schema_error_file_name(kind: DatasetKind, run_id: &RunId) -> String {
    format!("error_sv_{}_{}.csv", kind.short_code(), run_id)
}

/// 数据质量错误日志: `errors_dq_<kind>_<RunId>.csv`（同一运行内追加）
pub fn quality_error_file_name(kind: DatasetKind, run_id: &RunId) -> String {
    format!("errors_dq_{}_{}.csv", kind.short_code(), run_id)
}

/// 对象 key: `<Kind>/<file name>`
pub fn remote_key(kind: DatasetKind, file_name: &str) -> String {
    format!("{}/{}", kind.file_stem(), file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_match_convention() {
        let run_id = RunId::from("2024-01-01-10-00-00");

        assert_eq!(
            batch_file_name(DatasetKind::LoyaltyEarnedHourly, &run_id, 1),
            "Loyalty_Earned_Hourly_Data_Set_2024-01-01-10-00-00.csv"
        );
        assert_eq!(
            batch_file_name(DatasetKind::Purchases, &run_id, 2),
            "Purchases_Data_Set_2024-01-01-10-00-00_2.csv"
        );
        assert_eq!(
            schema_error_file_name(DatasetKind::LoyaltyEarnedHourly, &run_id),
            "error_sv_leh_2024-01-01-10-00-00.csv"
        );
        assert_eq!(
            quality_error_file_name(DatasetKind::Purchases, &run_id),
            "errors_dq_purchases_2024-01-01-10-00-00.csv"
        );
    }

    #[test]
    fn test_remote_key_and_file_name() {
        let key = remote_key(DatasetKind::Purchases, "Purchases_Data_Set_x.csv");
        assert_eq!(key, "Purchases_Data_Set/Purchases_Data_Set_x.csv");

        let reference = FileReference::remote(DatasetKind::Purchases, StorageArea::Processed, key);
        assert_eq!(reference.file_name(), "Purchases_Data_Set_x.csv");
        assert_eq!(
            reference.to_string(),
            "processed:Purchases_Data_Set/Purchases_Data_Set_x.csv"
        );
    }
}
