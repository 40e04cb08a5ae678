// ==========================================
// ArcFlow - 引擎层
// ==========================================
// 职责: 预算计算、学科规则校验、阶段进度推导、数据保留调度
// 红线: Engine 不拼 SQL, 所有规则违规必须输出 reason
// ==========================================

pub mod budget_calculator;
pub mod cron_trigger;
pub mod discipline_rules;
pub mod retention;
pub mod schedule;
pub mod scheduler;

// 重导出核心引擎
pub use budget_calculator::{BudgetCalculator, CalculationError, Multipliers};
pub use cron_trigger::{CronSchedule, TokioCronPrimitive};
pub use discipline_rules::{RuleViolation, RuleViolationKind};
pub use retention::{
    AuditSink, AuditWriteError, PurgeCategoryError, RecordPurger, RetentionPolicy, RetentionRoutine,
};
pub use schedule::build_schedule;
pub use scheduler::{
    ArmedSchedule, RecurringJob, RetentionScheduler, SchedulePrimitive, SchedulerError, TickFn,
};
