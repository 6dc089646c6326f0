// ==========================================
// 忠诚度数据 ETL - 数仓语句
// ==========================================

use crate::storage::TemporaryCredentials;
use std::fmt;

/// 数仓可执行语句
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseStatement {
    /// DDL / DML 原文
    Sql(String),
    /// 从对象存储批量装载分隔文件
    CopyInto {
        table: String,
        bucket: String,
        key: String,
        credentials: TemporaryCredentials,
        skip_header: bool,
    },
}

impl WarehouseStatement {
    pub fn sql(text: impl Into<String>) -> Self {
        WarehouseStatement::Sql(text.into())
    }
}

// 渲染为 COPY INTO 语法；凭证一律脱敏，可直接写日志
impl fmt::Display for WarehouseStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarehouseStatement::Sql(text) => f.write_str(text.trim()),
            WarehouseStatement::CopyInto {
                table,
                bucket,
                key,
                skip_header,
                ..
            } => write!(
                f,
                "COPY INTO {} FROM 's3://{}/{}' credentials=(AWS_KEY_ID='***' AWS_SECRET_KEY='***') FILE_FORMAT = (TYPE = CSV SKIP_HEADER = {})",
                table,
                bucket,
                key,
                if *skip_header { 1 } else { 0 }
            ),
        }
    }
}
