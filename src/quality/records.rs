// ==========================================
// 忠诚度数据 ETL - 强类型草稿行与记录
// ==========================================
// 流程: 完整行（schema 列顺序）→ 草稿（转换结果）→ 规则 → 记录
// 草稿中转换失败的字段为 None，由对应规则拒绝
// ==========================================

use crate::config::QualityConfig;
use crate::domain::dataset::{parse_timestamp, DatasetKind, TIMESTAMP_FORMAT};
use crate::domain::record::{LoyaltyEarnedHourlyRecord, PurchaseRecord};
use crate::quality::error::{QualityError, QualityResult};
use crate::quality::rules::{coerce_amount, coerce_integral, round_cents};
use chrono::NaiveDateTime;
use serde::Serialize;

/// 数据集强类型记录
pub trait DatasetRecord: Serialize + Sized {
    const KIND: DatasetKind;

    /// 规则作用的草稿行
    type Draft;

    /// 由完整行构造草稿
    fn draft(values: Vec<String>, config: &QualityConfig) -> QualityResult<Self::Draft>;

    /// 通过全部规则的草稿 → 记录
    fn finish(draft: Self::Draft) -> QualityResult<Self>;

    /// 规范化文本值（schema 列顺序），用作去重键
    fn to_row(&self) -> Vec<String>;
}

// ==========================================
// LoyaltyEarnedHourly
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct LoyaltyEarnedHourlyDraft {
    pub date: Option<NaiveDateTime>,
    pub user_id: String,
    pub country: String,
    pub total_lp_earned: Option<i64>,
}

impl DatasetRecord for LoyaltyEarnedHourlyRecord {
    const KIND: DatasetKind = DatasetKind::LoyaltyEarnedHourly;
    type Draft = LoyaltyEarnedHourlyDraft;

    fn draft(values: Vec<String>, _config: &QualityConfig) -> QualityResult<Self::Draft> {
        let [date, user_id, country, total_lp_earned] = row_fields::<4>(values)?;
        Ok(LoyaltyEarnedHourlyDraft {
            date: parse_timestamp(&date),
            user_id: user_id.trim().to_string(),
            country: country.trim().to_string(),
            total_lp_earned: coerce_integral(&total_lp_earned),
        })
    }

    fn finish(draft: Self::Draft) -> QualityResult<Self> {
        Ok(Self {
            date: required(draft.date, "date")?,
            user_id: draft.user_id,
            country: draft.country,
            total_lp_earned: required(draft.total_lp_earned, "total_lp_earned")?,
        })
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.date.format(TIMESTAMP_FORMAT).to_string(),
            self.user_id.clone(),
            self.country.clone(),
            self.total_lp_earned.to_string(),
        ]
    }
}

// ==========================================
// Purchases
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseDraft {
    pub date: Option<NaiveDateTime>,
    pub user_id: String,
    pub revenue: Option<f64>,
    pub transaction_id: String,
}

impl DatasetRecord for PurchaseRecord {
    const KIND: DatasetKind = DatasetKind::Purchases;
    type Draft = PurchaseDraft;

    fn draft(values: Vec<String>, config: &QualityConfig) -> QualityResult<Self::Draft> {
        let [date, user_id, revenue, transaction_id] = row_fields::<4>(values)?;
        Ok(PurchaseDraft {
            date: parse_timestamp(&date),
            user_id: user_id.trim().to_string(),
            revenue: coerce_amount(&revenue, &config.revenue_prefix),
            transaction_id,
        })
    }

    fn finish(draft: Self::Draft) -> QualityResult<Self> {
        Ok(Self {
            date: required(draft.date, "date")?,
            user_id: draft.user_id,
            revenue: round_cents(required(draft.revenue, "revenue")?),
            transaction_id: draft.transaction_id,
        })
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.date.format(TIMESTAMP_FORMAT).to_string(),
            self.user_id.clone(),
            self.revenue.to_string(),
            self.transaction_id.clone(),
        ]
    }
}

fn row_fields<const N: usize>(values: Vec<String>) -> QualityResult<[String; N]> {
    values
        .try_into()
        .map_err(|values: Vec<String>| QualityError::RowWidth {
            expected: N,
            found: values.len(),
        })
}

// 规则表未覆盖的字段在此兜底（例如跳过结构校验的批次）
fn required<T>(value: Option<T>, column: &str) -> QualityResult<T> {
    value.ok_or_else(|| QualityError::Coercion {
        column: column.to_string(),
        message: "字段未能转换为目标类型".to_string(),
    })
}
