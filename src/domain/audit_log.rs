// ==========================================
// ArcFlow - 审计日志领域模型
// ==========================================
// 红线: 所有配置写入与保留任务执行必须记录
// 对齐: audit_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// AuditEntry - 审计日志条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub audit_id: String,
    pub category: String,    // 类别: budget_configuration / retention ...
    pub action: String,      // 操作: SAVE / DELETE / RETENTION_RUN ...
    pub actor_id: String,    // 操作人 (系统任务为 "system")
    pub before_json: Option<JsonValue>,
    pub after_json: Option<JsonValue>,
    pub description: String,
    pub created_at: NaiveDateTime,
}

// ==========================================
// AuditAction - 常用操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    ConfigurationSave,
    ConfigurationDelete,
    RetentionRun,
}

impl AuditAction {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ConfigurationSave => "CONFIGURATION_SAVE",
            AuditAction::ConfigurationDelete => "CONFIGURATION_DELETE",
            AuditAction::RetentionRun => "RETENTION_RUN",
        }
    }
}

impl AuditEntry {
    /// 创建新的审计条目
    pub fn new(category: &str, action: &str, actor_id: &str, description: String) -> Self {
        Self {
            audit_id: uuid::Uuid::new_v4().to_string(),
            category: category.to_string(),
            action: action.to_string(),
            actor_id: actor_id.to_string(),
            before_json: None,
            after_json: None,
            description,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// 设置变更前快照
    pub fn with_before(mut self, before: Option<JsonValue>) -> Self {
        self.before_json = before;
        self
    }

    /// 设置变更后快照
    pub fn with_after(mut self, after: Option<JsonValue>) -> Self {
        self.after_json = after;
        self
    }
}
