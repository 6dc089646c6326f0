// ==========================================
// 忠诚度数据 ETL - 文件解析器实现
// ==========================================
// 阶段 0: 源文件读取与解析
// 支持: Excel (.xlsx/.xls，全部 sheet)
// ==========================================

use crate::domain::dataset::TIMESTAMP_FORMAT;
use crate::domain::record::{RawRow, Sheet, Workbook};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use std::path::{Path, PathBuf};

const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xls"];

// ==========================================
// WorkbookParser Trait
// ==========================================
pub trait WorkbookParser: Send + Sync {
    /// 解析文件为工作簿（每个 sheet 的表头 + 数据行）
    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Workbook>;
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl WorkbookParser for ExcelParser {
    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Workbook> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = extension_of(path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(path)?;

        let mut sheets = Vec::new();
        for sheet_name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet_name)?;
            let rows: Vec<Vec<Option<String>>> = range
                .rows()
                .map(|row| row.iter().map(cell_text).collect())
                .collect();
            sheets.push(sheet_from_rows(&sheet_name, rows));
        }

        Ok(Workbook {
            source: path.to_path_buf(),
            sheets,
        })
    }
}

/// 列出目录下的全部 Excel 文件（按文件名排序，保证运行可复现）
pub fn list_workbook_files(dir: &Path) -> ImportResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ImportError::FileNotFound(dir.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && EXCEL_EXTENSIONS.contains(&extension_of(&path).as_str()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 由单元格文本矩阵构造 Sheet
///
/// 第一行为表头；完全空白的数据行跳过；空表头按 `Unnamed: <列号>` 命名
pub fn sheet_from_rows(name: &str, rows: Vec<Vec<Option<String>>>) -> Sheet {
    let mut iter = rows.into_iter();
    let columns: Vec<String> = match iter.next() {
        Some(header) => header
            .into_iter()
            .enumerate()
            .map(|(idx, cell)| cell.unwrap_or_else(|| format!("Unnamed: {}", idx)))
            .collect(),
        None => Vec::new(),
    };

    let mut data_rows = Vec::new();
    for (idx, mut cells) in iter.enumerate() {
        cells.resize(columns.len(), None);
        let row = RawRow::new(idx + 2, cells);
        if row.is_blank() {
            continue;
        }
        data_rows.push(row);
    }

    Sheet {
        name: name.to_string(),
        columns,
        rows: data_rows,
    }
}

/// 单元格 → 文本（None 表示缺失）
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
            .or_else(|| Some(cell.to_string())),
        other => Some(other.to_string()),
    }
}

/// 整数值的浮点数不带小数部分输出（Excel 数字单元格均为浮点）
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
