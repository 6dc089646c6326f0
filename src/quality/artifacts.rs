// ==========================================
// 忠诚度数据 ETL - 清洗产物写出
// ==========================================
// 清洗后文件: 强类型记录按 schema 列顺序序列化（覆盖写）
// 错误日志: schema 列（原始值）+ error_rule（同一运行内追加）
// ==========================================

use crate::domain::dataset::DatasetKind;
use crate::domain::quality::RejectedRow;
use crate::importer::append_csv_records;
use crate::quality::error::{QualityError, QualityResult};
use crate::quality::records::DatasetRecord;
use csv::Writer;
use std::path::Path;

/// 错误日志中规则名所在列
pub const ERROR_RULE_COLUMN: &str = "error_rule";

/// 写出清洗后文件（schema 列顺序，覆盖写）
pub fn write_processed<R: DatasetRecord>(records: &[R], path: &Path) -> QualityResult<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
    }
    let mut writer = Writer::from_path(path).map_err(|e| write_error(path, e))?;

    if records.is_empty() {
        // 无记录时仍写表头，保证装载时跳过首行的语义一致
        let header: Vec<&str> = R::KIND.schema().column_names().collect();
        writer
            .write_record(&header)
            .map_err(|e| write_error(path, e))?;
    }
    for record in records {
        writer.serialize(record).map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| write_error(path, e))?;

    Ok(records.len())
}

/// 追加错误行到运行级错误日志
pub fn append_quality_errors(
    kind: DatasetKind,
    errors: &[RejectedRow],
    path: &Path,
) -> QualityResult<usize> {
    let mut header: Vec<&str> = kind.schema().column_names().collect();
    header.push(ERROR_RULE_COLUMN);

    let records = errors.iter().map(|rejected| {
        let mut record: Vec<String> = rejected
            .row
            .cells
            .iter()
            .map(|c| c.clone().unwrap_or_default())
            .collect();
        record.push(rejected.rule.clone());
        record
    });

    append_csv_records(path, &header, records).map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, err: impl std::fmt::Display) -> QualityError {
    QualityError::FileWriteError {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::TIMESTAMP_FORMAT;
    use crate::domain::record::{LoyaltyEarnedHourlyRecord, PurchaseRecord, RawRow};
    use chrono::NaiveDateTime;

    #[test]
    fn test_write_processed_typed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed/p.csv");
        let records = vec![PurchaseRecord {
            date: NaiveDateTime::parse_from_str("2024-01-01 10:00:00", TIMESTAMP_FORMAT).unwrap(),
            user_id: "AB12cde".to_string(),
            revenue: 4.5,
            transaction_id: "tx-1".to_string(),
        }];

        let written = write_processed(&records, &path).unwrap();

        assert_eq!(written, 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "date,userId,revenue,transaction_id\n2024-01-01 10:00:00,AB12cde,4.5,tx-1\n"
        );
    }

    #[test]
    fn test_write_processed_empty_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");

        let records: Vec<LoyaltyEarnedHourlyRecord> = Vec::new();
        write_processed(&records, &path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "date,userId,country,total_lp_earned\n"
        );
    }

    #[test]
    fn test_quality_errors_accumulate_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors_dq_leh_r1.csv");
        let rejected = |n: usize, points: &str, rule: &str| RejectedRow {
            row: RawRow::new(
                n,
                vec![
                    Some("2024-01-01 10:00:00".to_string()),
                    Some("AB12cde".to_string()),
                    None,
                    Some(points.to_string()),
                ],
            ),
            rule: rule.to_string(),
        };

        append_quality_errors(
            DatasetKind::LoyaltyEarnedHourly,
            &[rejected(2, "1", "missing_value")],
            &path,
        )
        .unwrap();
        append_quality_errors(
            DatasetKind::LoyaltyEarnedHourly,
            &[rejected(3, "-5", "missing_value")],
            &path,
        )
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "date,userId,country,total_lp_earned,error_rule\n\
             2024-01-01 10:00:00,AB12cde,,1,missing_value\n\
             2024-01-01 10:00:00,AB12cde,,-5,missing_value\n"
        );
    }
}
