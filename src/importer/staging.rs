// ==========================================
// 忠诚度数据 ETL - 落地 CSV 读写
// ==========================================
// 职责: 原始批次 ↔ 本地落地 CSV（阶段间以文件交接）
// 约定: 空单元格 = 缺失值
// ==========================================

use crate::domain::dataset::DatasetKind;
use crate::domain::record::{RawRecordBatch, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::path::Path;
use uuid::Uuid;

/// 写出原始批次（表头保持源列顺序）
pub fn write_staged_batch(batch: &RawRecordBatch, path: &Path) -> ImportResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
    }

    let mut writer = Writer::from_path(path).map_err(|e| write_error(path, e))?;
    writer
        .write_record(&batch.columns)
        .map_err(|e| write_error(path, e))?;
    for row in &batch.rows {
        writer
            .write_record(row.cells.iter().map(|c| c.as_deref().unwrap_or("")))
            .map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| write_error(path, e))?;
    Ok(())
}

/// 读取落地文件为原始批次
pub fn read_staged_batch(path: &Path, kind: DatasetKind) -> ImportResult<RawRecordBatch> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允许行长度不一致
        .from_reader(file);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let mut cells: Vec<Option<String>> = record
            .iter()
            .take(columns.len())
            .map(|v| {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect();
        cells.resize(columns.len(), None);

        let row = RawRow::new(idx + 2, cells);
        // 跳过完全空白的行
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }

    Ok(RawRecordBatch {
        kind,
        batch_id: Uuid::new_v4().to_string(),
        source: path.display().to_string(),
        columns,
        rows,
    })
}

/// 追加写入 CSV（文件不存在或为空时先写表头）
///
/// 同一运行内同一数据集的多个批次累积到一个错误文件
pub fn append_csv_records<I>(path: &Path, header: &[&str], records: I) -> csv::Result<usize>
where
    I: IntoIterator<Item = Vec<String>>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    if needs_header {
        writer.write_record(header)?;
    }
    let mut written = 0;
    for record in records {
        writer.write_record(&record)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

fn write_error(path: &Path, err: impl std::fmt::Display) -> ImportError {
    ImportError::FileWriteError {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_then_read_preserves_missing_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw/leh.csv");

        let batch = RawRecordBatch {
            kind: DatasetKind::LoyaltyEarnedHourly,
            batch_id: "b1".to_string(),
            source: "test".to_string(),
            columns: vec!["date".to_string(), "userId".to_string()],
            rows: vec![
                RawRow::new(2, vec![Some("2024-01-01 10:00:00".to_string()), None]),
                RawRow::new(3, vec![None, Some("AB12cde".to_string())]),
            ],
        };
        write_staged_batch(&batch, &path).unwrap();

        let loaded = read_staged_batch(&path, DatasetKind::LoyaltyEarnedHourly).unwrap();
        assert_eq!(loaded.columns, batch.columns);
        assert_eq!(loaded.rows, batch.rows);
    }

    #[test]
    fn test_read_skips_blank_and_pads_short_rows() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "date,userId,revenue").unwrap();
        writeln!(temp_file, "2024-01-01 10:00:00,AB12cde,PriceInUSD=1.99").unwrap();
        writeln!(temp_file, ",,").unwrap(); // 空行
        writeln!(temp_file, "2024-01-01 11:00:00, CD34efg ").unwrap();

        let batch = read_staged_batch(temp_file.path(), DatasetKind::Purchases).unwrap();

        assert_eq!(batch.row_count(), 2);
        assert_eq!(batch.rows[1].row_number, 4);
        assert_eq!(batch.rows[1].cells[1].as_deref(), Some("CD34efg"));
        assert_eq!(batch.rows[1].cells[2], None);
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors/error_sv_leh_r1.csv");

        append_csv_records(&path, &["error"], vec![vec!["first".to_string()]]).unwrap();
        append_csv_records(&path, &["error"], vec![vec!["second".to_string()]]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "error\nfirst\nsecond\n");
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_staged_batch(Path::new("missing.csv"), DatasetKind::Purchases);
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}
