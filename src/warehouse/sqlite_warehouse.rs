// ==========================================
// 忠诚度数据 ETL - SQLite 数仓实现
// ==========================================
// Sql: execute_batch 原样执行
// CopyInto: 从文件系统对象存储读取 CSV，按列位置插入（单事务）
// ==========================================

use crate::db::{open_in_memory, open_sqlite_connection};
use crate::storage::fs_storage::object_path;
use crate::warehouse::client::Warehouse;
use crate::warehouse::error::{WarehouseError, WarehouseResult};
use crate::warehouse::statement::WarehouseStatement;
use async_trait::async_trait;
use csv::ReaderBuilder;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub struct SqliteWarehouse {
    conn: Arc<Mutex<Connection>>,
    object_store_root: PathBuf,
}

impl SqliteWarehouse {
    /// 打开数仓数据库
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（父目录不存在时创建）
    /// - object_store_root: 文件系统对象存储根目录（CopyInto 的数据来源）
    pub fn open(db_path: &Path, object_store_root: impl Into<PathBuf>) -> WarehouseResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self::from_connection(
            Arc::new(Mutex::new(conn)),
            object_store_root,
        ))
    }

    /// 基于已有连接构造（共享连接）
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        object_store_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            conn,
            object_store_root: object_store_root.into(),
        }
    }

    /// 内存数仓（测试用）
    pub fn in_memory(object_store_root: impl Into<PathBuf>) -> WarehouseResult<Self> {
        let conn = open_in_memory()?;
        Ok(Self::from_connection(
            Arc::new(Mutex::new(conn)),
            object_store_root,
        ))
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    async fn execute(&self, statement: &WarehouseStatement) -> WarehouseResult<()> {
        let conn = Arc::clone(&self.conn);
        let root = self.object_store_root.clone();
        let statement = statement.clone();

        // SQLite 与文件读取均为阻塞操作，放到阻塞线程池执行
        tokio::task::spawn_blocking(move || execute_blocking(&conn, &root, &statement))
            .await
            .map_err(|e| WarehouseError::Task(e.to_string()))?
    }
}

fn execute_blocking(
    conn: &Mutex<Connection>,
    object_store_root: &Path,
    statement: &WarehouseStatement,
) -> WarehouseResult<()> {
    let mut conn = conn
        .lock()
        .map_err(|e| WarehouseError::LockError(e.to_string()))?;

    match statement {
        WarehouseStatement::Sql(sql) => {
            conn.execute_batch(sql)?;
            debug!(statement = %statement, "语句执行完成");
        }
        WarehouseStatement::CopyInto {
            table,
            bucket,
            key,
            skip_header,
            ..
        } => {
            let rows = copy_into(&mut conn, object_store_root, table, bucket, key, *skip_header)?;
            info!(table = %table, key = %key, rows, "批量装载完成");
        }
    }
    Ok(())
}

fn copy_into(
    conn: &mut Connection,
    object_store_root: &Path,
    table: &str,
    bucket: &str,
    key: &str,
    skip_header: bool,
) -> WarehouseResult<usize> {
    ensure_identifier(table)?;
    let path = object_path(object_store_root, bucket, key)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(skip_header)
        .from_path(&path)
        .map_err(|e| source_error(&path, e))?;

    let tx = conn.transaction()?;
    let mut inserted = 0;
    for result in reader.records() {
        let record = result.map_err(|e| source_error(&path, e))?;
        let placeholders = (1..=record.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("INSERT INTO {} VALUES ({})", table, placeholders);

        // 空字段按 NULL 装载
        let values = record.iter().map(|v| if v.is_empty() { None } else { Some(v) });
        tx.prepare_cached(&sql)?.execute(params_from_iter(values))?;
        inserted += 1;
    }
    tx.commit()?;

    Ok(inserted)
}

/// 表名只允许字母、数字、下划线
fn ensure_identifier(name: &str) -> WarehouseResult<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(WarehouseError::InvalidIdentifier(name.to_string()))
    }
}

fn source_error(path: &Path, err: impl std::fmt::Display) -> WarehouseError {
    WarehouseError::SourceReadError {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
