// ==========================================
// ArcFlow - API 层
// ==========================================
// 职责: 提供业务 API 接口,供宿主进程 / 管理界面调用
// ==========================================

pub mod budget_api;
pub mod budget_config_api;
pub mod catalog_api;
pub mod error;
pub mod retention_api;

// 重导出核心类型
pub use budget_api::BudgetApi;
pub use budget_config_api::{BudgetConfigApi, SaveConfigurationRequest};
pub use catalog_api::CatalogApi;
pub use error::{ApiError, ApiResult, ValidationViolation};
pub use retention_api::RetentionApi;
