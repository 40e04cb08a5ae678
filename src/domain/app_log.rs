// ==========================================
// ArcFlow - 应用运行日志领域模型
// ==========================================
// 用途: API 操作的运行记录 (计算成功/失败等), 供管理界面排查
// 对齐: app_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppLogLevel {
    Info,
    Warn,
    Error,
}

impl AppLogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppLogLevel::Info => "INFO",
            AppLogLevel::Warn => "WARN",
            AppLogLevel::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INFO" => Some(AppLogLevel::Info),
            "WARN" => Some(AppLogLevel::Warn),
            "ERROR" => Some(AppLogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for AppLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppLogEntry {
    pub log_id: String,
    pub level: AppLogLevel,
    pub target: String,   // 来源模块, 如 budget_api
    pub tenant_id: Option<String>,
    pub message: String,
    pub created_at: NaiveDateTime,
}

impl AppLogEntry {
    pub fn new(level: AppLogLevel, target: &str, tenant_id: Option<&str>, message: String) -> Self {
        Self {
            log_id: uuid::Uuid::new_v4().to_string(),
            level,
            target: target.to_string(),
            tenant_id: tenant_id.map(|t| t.to_string()),
            message,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
