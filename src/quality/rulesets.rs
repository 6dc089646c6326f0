// ==========================================
// 忠诚度数据 ETL - 数据集规则表
// ==========================================
// 顺序即执行顺序；缺失值检查在所有规则之前，去重在所有规则之后
// 新增数据集: 定义草稿类型并在此追加规则表
// ==========================================

use crate::config::QualityConfig;
use crate::quality::error::{QualityError, QualityResult};
use crate::quality::records::{LoyaltyEarnedHourlyDraft, PurchaseDraft};
use crate::quality::rules::{
    QualityRule, INVALID_COUNTRY, INVALID_DATE, INVALID_REVENUE, INVALID_TOTAL_LP_EARNED,
    INVALID_USER_ID,
};
use regex::Regex;

fn user_id_pattern(config: &QualityConfig) -> QualityResult<Regex> {
    Regex::new(&config.user_id_pattern).map_err(|e| QualityError::InvalidPattern {
        rule: INVALID_USER_ID.to_string(),
        message: e.to_string(),
    })
}

/// 小时积分: userId → country → total_lp_earned（整数，>= 0）
pub fn loyalty_ruleset(
    config: &QualityConfig,
) -> QualityResult<Vec<QualityRule<LoyaltyEarnedHourlyDraft>>> {
    let pattern = user_id_pattern(config)?;
    let allowed = config.allowed_countries.clone();

    Ok(vec![
        QualityRule::new(INVALID_USER_ID, move |r: &LoyaltyEarnedHourlyDraft| {
            pattern.is_match(&r.user_id)
        }),
        QualityRule::new(INVALID_COUNTRY, move |r: &LoyaltyEarnedHourlyDraft| {
            allowed.iter().any(|c| *c == r.country)
        }),
        QualityRule::new(INVALID_TOTAL_LP_EARNED, |r: &LoyaltyEarnedHourlyDraft| {
            r.total_lp_earned.is_some_and(|points| points >= 0)
        }),
    ])
}

/// 购买: date → userId → revenue（去前缀后 > 0）
pub fn purchase_ruleset(config: &QualityConfig) -> QualityResult<Vec<QualityRule<PurchaseDraft>>> {
    let pattern = user_id_pattern(config)?;

    Ok(vec![
        QualityRule::new(INVALID_DATE, |r: &PurchaseDraft| r.date.is_some()),
        QualityRule::new(INVALID_USER_ID, move |r: &PurchaseDraft| {
            pattern.is_match(&r.user_id)
        }),
        QualityRule::new(INVALID_REVENUE, |r: &PurchaseDraft| {
            r.revenue.is_some_and(|amount| amount > 0.0)
        }),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<D>(rules: &[QualityRule<D>]) -> Vec<&'static str> {
        rules.iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_rule_order_per_kind() {
        let config = QualityConfig::default();

        assert_eq!(
            names(&loyalty_ruleset(&config).unwrap()),
            vec![INVALID_USER_ID, INVALID_COUNTRY, INVALID_TOTAL_LP_EARNED]
        );
        assert_eq!(
            names(&purchase_ruleset(&config).unwrap()),
            vec![INVALID_DATE, INVALID_USER_ID, INVALID_REVENUE]
        );
    }

    #[test]
    fn test_loyalty_rules_on_draft_fields() {
        let rules = loyalty_ruleset(&QualityConfig::default()).unwrap();
        let draft = LoyaltyEarnedHourlyDraft {
            date: None,
            user_id: "AB12cde".to_string(),
            country: "FR".to_string(),
            total_lp_earned: Some(-1),
        };

        let failing: Vec<_> = rules
            .iter()
            .filter(|r| !r.passes(&draft))
            .map(|r| r.name)
            .collect();
        assert_eq!(failing, vec![INVALID_COUNTRY, INVALID_TOTAL_LP_EARNED]);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let config = QualityConfig {
            user_id_pattern: "([".to_string(),
            ..QualityConfig::default()
        };
        assert!(matches!(
            purchase_ruleset(&config),
            Err(QualityError::InvalidPattern { .. })
        ));
    }
}
