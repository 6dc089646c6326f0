// ==========================================
// 忠诚度数据 ETL - 数仓 SQL
// ==========================================
// staging 表: 每次装载前整表重建
// 汇总表: 整表重建 + 一条确定性 INSERT ... SELECT
// ==========================================

use crate::domain::dataset::DatasetKind;

pub const SUMMARY_TABLE: &str = "hourly_daily_summary";

/// staging 表建表语句（先删后建）
pub fn create_staging_table_sql(kind: DatasetKind) -> String {
    let columns = match kind {
        DatasetKind::LoyaltyEarnedHourly => {
            "date TIMESTAMP,\n    user_id VARCHAR(20),\n    country CHAR(2),\n    total_lp_earned INT"
        }
        DatasetKind::Purchases => {
            "date TIMESTAMP,\n    user_id VARCHAR(20),\n    revenue DECIMAL(10, 2),\n    transaction_id VARCHAR(36)"
        }
    };
    format!(
        "DROP TABLE IF EXISTS {table};\nCREATE TABLE {table} (\n    {columns}\n);",
        table = kind.staging_table(),
        columns = columns
    )
}

pub const CREATE_SUMMARY_TABLE_SQL: &str = r#"
DROP TABLE IF EXISTS hourly_daily_summary;
CREATE TABLE hourly_daily_summary (
    app_date TIMESTAMP,
    user_id VARCHAR(255),
    country VARCHAR(255),
    user_total_lp_earned INT,
    user_total_revenue DECIMAL(10, 2),
    user_total_purchases INT,
    user_avg_revenue_per_purchase DECIMAL(10, 2),
    total_daily_revenue DECIMAL(10, 2)
);
"#;

// 购买按小时截断后挂到积分记录上；按 用户×小时 汇总，再附加 用户×日 收入合计
pub const POPULATE_SUMMARY_SQL: &str = r#"
WITH purchases_hourly AS (
    SELECT
        strftime('%Y-%m-%d %H:00:00', date) AS date_hourly,
        user_id,
        revenue,
        transaction_id
    FROM staging_purchases
),
loyalty_hourly AS (
    SELECT date, user_id, country, total_lp_earned
    FROM staging_loyalty_earned_hourly
),
merged AS (
    SELECT
        l.date AS app_date,
        l.user_id,
        l.country,
        l.total_lp_earned,
        p.revenue,
        p.transaction_id
    FROM loyalty_hourly l
    LEFT JOIN purchases_hourly p
        ON l.user_id = p.user_id AND l.date = p.date_hourly
),
hourly_summary AS (
    SELECT
        app_date,
        user_id,
        country,
        SUM(total_lp_earned) AS user_total_lp_earned,
        SUM(COALESCE(revenue, 0)) AS user_total_revenue,
        COUNT(transaction_id) AS user_total_purchases,
        CASE WHEN COUNT(transaction_id) > 0
             THEN ROUND(CAST(SUM(COALESCE(revenue, 0)) AS REAL) / COUNT(transaction_id), 2)
             ELSE 0 END AS user_avg_revenue_per_purchase
    FROM merged
    GROUP BY app_date, user_id, country
),
daily_revenue AS (
    SELECT
        user_id,
        date(app_date) AS date_daily,
        SUM(COALESCE(revenue, 0)) AS total_daily_revenue
    FROM merged
    GROUP BY user_id, date(app_date)
)
INSERT INTO hourly_daily_summary
SELECT
    h.app_date,
    h.user_id,
    h.country,
    h.user_total_lp_earned,
    h.user_total_revenue,
    h.user_total_purchases,
    h.user_avg_revenue_per_purchase,
    d.total_daily_revenue
FROM hourly_summary h
LEFT JOIN daily_revenue d
    ON h.user_id = d.user_id AND date(h.app_date) = d.date_daily
ORDER BY h.app_date, h.user_id, h.country;
"#;
