// ==========================================
// ArcFlow - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod app_log;
pub mod audit_log;
pub mod budget;
pub mod budget_version;
pub mod discipline;
pub mod retention;
pub mod types;

// 重导出核心类型
pub use app_log::{AppLogEntry, AppLogLevel};
pub use audit_log::{AuditAction, AuditEntry};
pub use budget::{BudgetBreakdown, BudgetResult, ProjectParameters, SchedulePhase};
pub use budget_version::BudgetVersion;
pub use discipline::{BudgetConfiguration, ConfigurationView, Discipline, DisciplineConfig};
pub use retention::{RetentionRun, SchedulerStatus};
pub use types::{
    DisciplineCategory, DisciplineCode, PhaseCode, PricingMode, RetentionOutcome, RunTrigger,
    SchedulerState,
};
