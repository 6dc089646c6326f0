// ==========================================
// 忠诚度数据 ETL - 数据质量规则
// ==========================================
// 规则 = 名称 + 对强类型草稿行的谓词
// 数值/时间字段在构造草稿时完成转换，规则只做字段访问
// ==========================================

use std::fmt;

// 规则名（错误日志 error_rule 列的取值）
pub const MISSING_VALUE: &str = "missing_value";
pub const INVALID_USER_ID: &str = "invalid_user_id";
pub const INVALID_COUNTRY: &str = "invalid_country";
pub const INVALID_TOTAL_LP_EARNED: &str = "invalid_total_lp_earned";
pub const INVALID_DATE: &str = "invalid_date";
pub const INVALID_REVENUE: &str = "invalid_revenue";

// f64 可精确表示的最大整数（2^53）
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

pub struct QualityRule<D> {
    pub name: &'static str,
    check: Box<dyn Fn(&D) -> bool + Send + Sync>,
}

impl<D> QualityRule<D> {
    pub fn new(name: &'static str, check: impl Fn(&D) -> bool + Send + Sync + 'static) -> Self {
        Self {
            name,
            check: Box::new(check),
        }
    }

    /// 行是否通过本规则
    pub fn passes(&self, draft: &D) -> bool {
        (self.check)(draft)
    }
}

impl<D> fmt::Debug for QualityRule<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualityRule").field("name", &self.name).finish()
    }
}

// ==========================================
// 字段转换
// ==========================================

/// 整数转换
///
/// 先按 i64 解析（大数不经浮点，原值不变）；
/// `12.0` 之类的写法仅在浮点可精确表示的范围内接受
pub fn coerce_integral(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    let value: f64 = text.parse().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_FLOAT_INT {
        Some(value as i64)
    } else {
        None
    }
}

/// 金额转换: 去掉前缀后按数字解析
pub fn coerce_amount(text: &str, prefix: &str) -> Option<f64> {
    let text = text.trim();
    let number = text.strip_prefix(prefix).unwrap_or(text).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 金额保留两位小数（staging 列为 DECIMAL(10, 2)）
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_passes_by_field_access() {
        struct Row {
            points: Option<i64>,
        }
        let rule = QualityRule::new(INVALID_TOTAL_LP_EARNED, |r: &Row| {
            r.points.is_some_and(|p| p >= 0)
        });

        assert!(rule.passes(&Row { points: Some(0) }));
        assert!(!rule.passes(&Row { points: Some(-5) }));
        assert!(!rule.passes(&Row { points: None }));
        assert_eq!(format!("{:?}", rule), "QualityRule { name: \"invalid_total_lp_earned\" }");
    }

    #[test]
    fn test_integral_rejects_fraction_and_garbage() {
        assert_eq!(coerce_integral("0"), Some(0));
        assert_eq!(coerce_integral(" 12.0 "), Some(12));
        assert_eq!(coerce_integral("-5"), Some(-5));
        assert_eq!(coerce_integral("1.5"), None);
        assert_eq!(coerce_integral("ten"), None);
        assert_eq!(coerce_integral("inf"), None);
    }

    #[test]
    fn test_integral_keeps_large_values_exact() {
        assert_eq!(coerce_integral("9007199254740993"), Some(9_007_199_254_740_993));
        assert_eq!(coerce_integral("9223372036854775807"), Some(i64::MAX));
        // 超出浮点精确范围的小数写法无法保证原值，拒绝
        assert_eq!(coerce_integral("9007199254740994.0"), None);
    }

    #[test]
    fn test_amount_strips_prefix() {
        assert_eq!(coerce_amount("PriceInUSD=4.50", "PriceInUSD="), Some(4.5));
        assert_eq!(coerce_amount("3", "PriceInUSD="), Some(3.0));
        assert_eq!(coerce_amount("PriceInUSD=", "PriceInUSD="), None);
        assert_eq!(coerce_amount("free", "PriceInUSD="), None);
        assert_eq!(coerce_amount("PriceInUSD=NaN", "PriceInUSD="), None);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(1.234), 1.23);
        assert_eq!(round_cents(2.499), 2.5);
        assert_eq!(round_cents(4.5), 4.5);
    }
}
