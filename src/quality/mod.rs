// ==========================================
// 忠诚度数据 ETL - 数据质量层
// ==========================================
// 职责: 声明式行级规则、批次清洗、清洗/错误产物写出
// 粒度: 行（与结构校验层的批次粒度相对）
// ==========================================

pub mod artifacts;
pub mod error;
pub mod records;
pub mod rules;
pub mod rulesets;
pub mod transform_stage;
pub mod transformer;

pub use artifacts::{append_quality_errors, write_processed, ERROR_RULE_COLUMN};
pub use error::{QualityError, QualityResult};
pub use records::{DatasetRecord, LoyaltyEarnedHourlyDraft, PurchaseDraft};
pub use rules::QualityRule;
pub use rulesets::{loyalty_ruleset, purchase_ruleset};
pub use transform_stage::{TransformStage, TransformSummary};
pub use transformer::{transform, CleanBatch, QualityTransformer};
