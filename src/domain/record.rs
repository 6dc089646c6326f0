// ==========================================
// 忠诚度数据 ETL - 记录模型
// ==========================================
// 职责: 工作簿/工作表、原始批次、清洗后的强类型记录
// 生命周期: 原始批次由分类器产出，经结构校验后交给清洗层
// ==========================================

use crate::domain::dataset::{DatasetKind, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::path::PathBuf;

// ==========================================
// RawRow - 原始行（字符串单元格，None = 缺失）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub row_number: usize, // 源文件行号（表头为第 1 行）
    pub cells: Vec<Option<String>>,
}

impl RawRow {
    pub fn new(row_number: usize, cells: Vec<Option<String>>) -> Self {
        Self { row_number, cells }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    pub fn has_missing(&self) -> bool {
        self.cells.iter().any(|c| c.is_none())
    }
}

// ==========================================
// Sheet / Workbook - 解析后的电子表格
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl Sheet {
    pub fn column_set(&self) -> HashSet<&str> {
        self.columns.iter().map(|c| c.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    pub source: PathBuf,
    pub sheets: Vec<Sheet>,
}

// ==========================================
// RawRecordBatch - 原始记录批次
// ==========================================
// 一个 sheet 对应一个批次；列顺序保持源表原样
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecordBatch {
    pub kind: DatasetKind,
    pub batch_id: String,
    pub source: String, // 来源描述（文件名#sheet 或落地文件路径）
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawRecordBatch {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ==========================================
// 时间戳序列化（统一 YYYY-MM-DD HH:MM:SS）
// ==========================================
fn serialize_timestamp<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
}

// ==========================================
// LoyaltyEarnedHourlyRecord - 小时积分记录
// ==========================================
// 对齐: staging_loyalty_earned_hourly 表列顺序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoyaltyEarnedHourlyRecord {
    #[serde(serialize_with = "serialize_timestamp")]
    pub date: NaiveDateTime,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub country: String,
    pub total_lp_earned: i64,
}

// ==========================================
// PurchaseRecord - 购买记录
// ==========================================
// 对齐: staging_purchases 表列顺序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRecord {
    #[serde(serialize_with = "serialize_timestamp")]
    pub date: NaiveDateTime,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub revenue: f64,
    pub transaction_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_row_blank_and_missing() {
        let blank = RawRow::new(2, vec![None, None]);
        assert!(blank.is_blank());

        let partial = RawRow::new(3, vec![Some("US".to_string()), None]);
        assert!(!partial.is_blank());
        assert!(partial.has_missing());
    }

    #[test]
    fn test_record_serializes_with_source_headers() {
        let record = PurchaseRecord {
            date: NaiveDateTime::parse_from_str("2024-01-01 10:15:00", TIMESTAMP_FORMAT).unwrap(),
            user_id: "AB12cde".to_string(),
            revenue: 1.99,
            transaction_id: "tx-1".to_string(),
        };

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&record).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert_eq!(
            out,
            "date,userId,revenue,transaction_id\n2024-01-01 10:15:00,AB12cde,1.99,tx-1\n"
        );
    }
}
