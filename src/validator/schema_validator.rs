// ==========================================
// 忠诚度数据 ETL - 结构校验器
// ==========================================
// 阶段 2: 结构闸门（整批通过或整批拒绝，不做行级过滤）
// 检查: 列数一致 → 逐列存在 → 逐列类型
// ==========================================

use crate::domain::dataset::Schema;
use crate::domain::record::RawRecordBatch;

/// 结构校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(Vec<String>), // 按检查顺序排列的错误描述
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn errors(&self) -> &[String] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(errors) => errors,
        }
    }
}

pub struct SchemaValidator;

impl SchemaValidator {
    /// 校验批次结构
    ///
    /// 错误描述至多 `1 + schema.len()` 条；类型错误按列汇总，不按值展开
    pub fn validate(batch: &RawRecordBatch, schema: &Schema) -> ValidationResult {
        let mut errors = Vec::new();

        // 列数检查不短路
        if batch.columns.len() != schema.len() {
            errors.push(format!(
                "Column count mismatch. Expected {}, found {}.",
                schema.len(),
                batch.columns.len()
            ));
        }

        for column in schema.columns() {
            let Some(idx) = batch.column_index(column.name) else {
                errors.push(format!("Missing expected column: {}", column.name));
                continue;
            };

            // 缺失值留给数据质量阶段处理
            let type_ok = batch
                .rows
                .iter()
                .filter_map(|row| row.cells.get(idx).and_then(|c| c.as_deref()))
                .all(|value| column.column_type.accepts(value));

            if !type_ok {
                errors.push(format!(
                    "Column '{}' has incorrect data type. Expected {}.",
                    column.name,
                    column.column_type.predicate_name()
                ));
            }
        }

        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(errors)
        }
    }
}
