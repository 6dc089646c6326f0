// ==========================================
// 忠诚度数据 ETL - 配置层
// ==========================================
// 职责: 路径、存储桶、凭证、数据质量参数
// 来源: 默认值 / TOML 文件 / 环境变量
// ==========================================

pub mod pipeline_config;

pub use pipeline_config::{
    config_keys, default_warehouse_db_path, BucketConfig, ConfigError, ConfigResult,
    CredentialConfig, PipelineConfig, QualityConfig,
};
