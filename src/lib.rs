// ==========================================
// ArcFlow - 核心库
// ==========================================
// 职责: 建筑设计预算引擎 + 数据保留调度器
// 技术栈: Rust + SQLite + tokio
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 学科目录 - 静态参考数据
pub mod catalog;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 计算规则与调度
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DisciplineCode, PhaseCode, RunTrigger, SchedulerState};

// 领域实体
pub use domain::{
    AuditEntry, BudgetConfiguration, BudgetResult, BudgetVersion, ProjectParameters,
    RetentionRun, SchedulerStatus,
};

// 引擎
pub use engine::{BudgetCalculator, RetentionRoutine, RetentionScheduler};

// API
pub use api::{BudgetApi, BudgetConfigApi, CatalogApi, RetentionApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "ArcFlow";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
