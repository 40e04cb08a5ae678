// ==========================================
// ArcFlow - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod app_log_repo;
pub mod audit_log_repo;
pub mod budget_config_repo;
pub mod budget_history_repo;
pub mod error;

// 重导出核心仓储
pub use app_log_repo::AppLogRepository;
pub use audit_log_repo::AuditLogRepository;
pub use budget_config_repo::BudgetConfigRepository;
pub use budget_history_repo::BudgetHistoryRepository;
pub use error::{RepositoryError, RepositoryResult};
