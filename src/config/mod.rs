// ==========================================
// ArcFlow - 配置层
// ==========================================
// 职责: 系统配置管理 (计价参数、数据保留任务)
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod pricing_tables;
pub mod retention_settings;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use pricing_tables::{IndirectCostRates, PricingTables};
pub use retention_settings::RetentionSettings;
