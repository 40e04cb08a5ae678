// ==========================================
// ArcFlow - 数据保留任务配置
// ==========================================
// 存储位置: config_kv (scope_id='global', key='retention/*')
// ==========================================

use serde::{Deserialize, Serialize};

/// 默认 cron: 每天 02:00
pub const DEFAULT_RETENTION_CRON: &str = "0 2 * * *";
/// 默认时区
pub const DEFAULT_RETENTION_TIMEZONE: &str = "America/Sao_Paulo";
pub const DEFAULT_BUDGET_HISTORY_MONTHS: u32 = 12;
pub const DEFAULT_AUDIT_LOG_MONTHS: u32 = 24;
pub const DEFAULT_APP_LOG_MONTHS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionSettings {
    /// 宿主启动时是否自动启动调度
    pub enabled: bool,
    pub cron_expression: String,
    pub timezone: String,
    pub budget_history_months: u32,
    pub audit_log_months: u32,
    pub app_log_months: u32,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cron_expression: DEFAULT_RETENTION_CRON.to_string(),
            timezone: DEFAULT_RETENTION_TIMEZONE.to_string(),
            budget_history_months: DEFAULT_BUDGET_HISTORY_MONTHS,
            audit_log_months: DEFAULT_AUDIT_LOG_MONTHS,
            app_log_months: DEFAULT_APP_LOG_MONTHS,
        }
    }
}
