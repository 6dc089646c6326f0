// ==========================================
// 忠诚度数据 ETL - 数据集类型与结构定义
// ==========================================
// 职责: 定义已知数据集（DatasetKind）及其结构 Schema
// 红线: 数据集相关的列名/类型只在此处与规则表中出现
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// 统一时间戳格式（落地文件与数仓一致）
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// 源文件中可能出现的时间格式
const ACCEPTED_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// 解析时间戳（兼容纯日期，按 00:00:00 处理）
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    for format in ACCEPTED_TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }
    chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ==========================================
// ColumnType - 列逻辑类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    String,
    Numeric,
    Timestamp,
}

impl ColumnType {
    /// 单值类型判定
    ///
    /// 空值不在此处判定（缺失值属于行级数据质量问题）
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            ColumnType::String => true,
            ColumnType::Numeric => value
                .trim()
                .parse::<f64>()
                .map(|v| v.is_finite())
                .unwrap_or(false),
            ColumnType::Timestamp => parse_timestamp(value).is_some(),
        }
    }

    /// 类型名（用于结构校验错误描述）
    pub fn predicate_name(&self) -> &'static str {
        match self {
            ColumnType::String => "is_string_dtype",
            ColumnType::Numeric => "is_numeric_dtype",
            ColumnType::Timestamp => "is_datetime64_any_dtype",
        }
    }
}

// ==========================================
// ColumnSpec / Schema - 数据集结构
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
}

/// 有序列定义（列名 → 逻辑类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    columns: &'static [ColumnSpec],
}

impl Schema {
    pub const fn new(columns: &'static [ColumnSpec]) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &'static [ColumnSpec] {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|c| c.name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

const LOYALTY_EARNED_HOURLY_SCHEMA: Schema = Schema::new(&[
    ColumnSpec { name: "date", column_type: ColumnType::Timestamp },
    ColumnSpec { name: "userId", column_type: ColumnType::String },
    ColumnSpec { name: "country", column_type: ColumnType::String },
    ColumnSpec { name: "total_lp_earned", column_type: ColumnType::Numeric },
]);

const PURCHASES_SCHEMA: Schema = Schema::new(&[
    ColumnSpec { name: "date", column_type: ColumnType::Timestamp },
    ColumnSpec { name: "userId", column_type: ColumnType::String },
    ColumnSpec { name: "revenue", column_type: ColumnType::String },
    ColumnSpec { name: "transaction_id", column_type: ColumnType::String },
]);

// ==========================================
// DatasetKind - 已知数据集
// ==========================================
// 顺序即分类优先级: 同时匹配多个数据集的 sheet 归入第一个
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    LoyaltyEarnedHourly,
    Purchases,
}

impl DatasetKind {
    /// 按分类优先级排列
    pub const ALL: [DatasetKind; 2] = [DatasetKind::LoyaltyEarnedHourly, DatasetKind::Purchases];

    pub fn schema(&self) -> &'static Schema {
        match self {
            DatasetKind::LoyaltyEarnedHourly => &LOYALTY_EARNED_HOURLY_SCHEMA,
            DatasetKind::Purchases => &PURCHASES_SCHEMA,
        }
    }

    /// 分类所需列集合
    pub fn required_columns(&self) -> HashSet<&'static str> {
        self.schema().column_names().collect()
    }

    /// 落地文件名前缀 / 存储子路径
    pub fn file_stem(&self) -> &'static str {
        match self {
            DatasetKind::LoyaltyEarnedHourly => "Loyalty_Earned_Hourly_Data_Set",
            DatasetKind::Purchases => "Purchases_Data_Set",
        }
    }

    /// 错误文件名中的短代码
    pub fn short_code(&self) -> &'static str {
        match self {
            DatasetKind::LoyaltyEarnedHourly => "leh",
            DatasetKind::Purchases => "purchases",
        }
    }

    /// 数仓 staging 表名
    pub fn staging_table(&self) -> &'static str {
        match self {
            DatasetKind::LoyaltyEarnedHourly => "staging_loyalty_earned_hourly",
            DatasetKind::Purchases => "staging_purchases",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_positions() {
        let schema = DatasetKind::Purchases.schema();
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.position("revenue"), Some(2));
        assert_eq!(schema.position("country"), None);
    }

    #[test]
    fn test_column_type_accepts() {
        assert!(ColumnType::Numeric.accepts("12"));
        assert!(ColumnType::Numeric.accepts("-5.5"));
        assert!(!ColumnType::Numeric.accepts("abc"));
        assert!(ColumnType::Timestamp.accepts("2024-01-01 10:00:00"));
        assert!(ColumnType::Timestamp.accepts("2024-01-01"));
        assert!(!ColumnType::Timestamp.accepts("yesterday"));
        assert!(ColumnType::String.accepts("AB12cde"));
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(DatasetKind::ALL[0], DatasetKind::LoyaltyEarnedHourly);
        assert_eq!(DatasetKind::LoyaltyEarnedHourly.short_code(), "leh");
        assert_eq!(
            DatasetKind::Purchases.to_string(),
            "Purchases_Data_Set"
        );
    }
}
