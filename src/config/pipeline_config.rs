// ==========================================
// 忠诚度数据 ETL - 流水线配置
// ==========================================
// 职责: 配置加载（默认值 → TOML 文件 → 环境变量覆写）
// 存储: 可选 TOML 文件 + 进程环境变量
// ==========================================

use crate::domain::artifact::StorageArea;
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件解析失败: {0}")]
    ParseError(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// BucketConfig - 对象存储桶
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    pub landing: String,
    pub raw: String,
    pub error: String,
    pub processed: String,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            landing: "playstudios-landing-data".to_string(),
            raw: "playstudios-raw-data".to_string(),
            error: "playstudios-error-data".to_string(),
            processed: "playstudios-processed-data".to_string(),
        }
    }
}

impl BucketConfig {
    /// 存储区对应的桶名（本地区无桶）
    pub fn bucket_for(&self, area: StorageArea) -> Option<&str> {
        match area {
            StorageArea::Local => None,
            StorageArea::Landing => Some(&self.landing),
            StorageArea::Raw => Some(&self.raw),
            StorageArea::Error => Some(&self.error),
            StorageArea::Processed => Some(&self.processed),
        }
    }
}

// ==========================================
// CredentialConfig - 存储访问凭证
// ==========================================
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

// ==========================================
// QualityConfig - 数据质量规则参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub user_id_pattern: String,
    pub allowed_countries: Vec<String>,
    pub revenue_prefix: String,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            user_id_pattern: r"^[A-Za-z]{2}\d{2}[A-Za-z]{3}$".to_string(),
            allowed_countries: vec!["US".to_string(), "CA".to_string()],
            revenue_prefix: "PriceInUSD=".to_string(),
        }
    }
}

// ==========================================
// PipelineConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub work_dir: PathBuf,
    pub object_store_root: PathBuf,
    pub warehouse_db_path: PathBuf,
    pub buckets: BucketConfig,
    pub credentials: CredentialConfig,
    pub quality: QualityConfig,
    pub log_format: LogFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./data"),
            work_dir: PathBuf::from("./staging"),
            object_store_root: PathBuf::from("./object_store"),
            warehouse_db_path: default_warehouse_db_path(),
            buckets: BucketConfig::default(),
            credentials: CredentialConfig::default(),
            quality: QualityConfig::default(),
            log_format: LogFormat::Text,
        }
    }
}

impl PipelineConfig {
    /// 加载配置
    ///
    /// # 参数
    /// - path: 可选 TOML 配置文件
    ///
    /// # 顺序
    /// 默认值 → TOML 文件 → 环境变量
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_toml_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// 应用覆写（键见 `config_keys`）
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get(config_keys::INPUT_DIR) {
            self.input_dir = PathBuf::from(v);
        }
        if let Some(v) = get(config_keys::WORK_DIR) {
            self.work_dir = PathBuf::from(v);
        }
        if let Some(v) = get(config_keys::OBJECT_STORE_ROOT) {
            self.object_store_root = PathBuf::from(v);
        }
        if let Some(v) = get(config_keys::WAREHOUSE_DB) {
            self.warehouse_db_path = PathBuf::from(v);
        }
        if let Some(v) = get(config_keys::ACCESS_KEY_ID) {
            self.credentials.access_key_id = v;
        }
        if let Some(v) = get(config_keys::SECRET_ACCESS_KEY) {
            self.credentials.secret_access_key = v;
        }
        if let Some(v) = get(config_keys::ALLOWED_COUNTRIES) {
            let countries: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if countries.is_empty() {
                tracing::warn!(
                    config_key = config_keys::ALLOWED_COUNTRIES,
                    raw_value = %v,
                    "国家代码配置为空，保留原配置"
                );
            } else {
                self.quality.allowed_countries = countries;
            }
        }
        if let Some(v) = get(config_keys::LOG_FORMAT) {
            match v.to_lowercase().as_str() {
                "json" => self.log_format = LogFormat::Json,
                "text" => self.log_format = LogFormat::Text,
                _ => tracing::warn!(
                    config_key = config_keys::LOG_FORMAT,
                    raw_value = %v,
                    "日志格式配置无效，保留原配置"
                ),
            }
        }
    }
}

/// 默认数仓数据库路径
///
/// 优先环境变量，其次用户数据目录，最后回退到当前目录
pub fn default_warehouse_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(config_keys::WAREHOUSE_DB) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("loyalty-etl").join("warehouse.db"),
        None => PathBuf::from("./warehouse.db"),
    }
}

// ==========================================
// 配置键常量（环境变量名）
// ==========================================
pub mod config_keys {
    // 源文件目录（沿用调度器约定的变量名）
    pub const INPUT_DIR: &str = "directory_path";

    // 本地落地与对象存储
    pub const WORK_DIR: &str = "LOYALTY_ETL_WORK_DIR";
    pub const OBJECT_STORE_ROOT: &str = "LOYALTY_ETL_OBJECT_STORE";

    // 数仓
    pub const WAREHOUSE_DB: &str = "LOYALTY_ETL_WAREHOUSE_DB";

    // 凭证
    pub const ACCESS_KEY_ID: &str = "LOYALTY_ETL_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY: &str = "LOYALTY_ETL_SECRET_ACCESS_KEY";

    // 数据质量
    pub const ALLOWED_COUNTRIES: &str = "LOYALTY_ETL_ALLOWED_COUNTRIES";

    // 日志
    pub const LOG_FORMAT: &str = "LOYALTY_ETL_LOG_FORMAT";
}
