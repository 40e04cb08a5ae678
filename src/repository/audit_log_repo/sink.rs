// 审计日志仓储作为保留任务的审计落地与清理类别
use super::core::AuditLogRepository;
use crate::domain::audit_log::AuditEntry;
use crate::engine::retention::{AuditSink, AuditWriteError, PurgeCategoryError, RecordPurger};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

#[async_trait]
impl AuditSink for AuditLogRepository {
    async fn record(
        &self,
        category: &str,
        action: &str,
        actor_id: &str,
        before: Option<JsonValue>,
        after: Option<JsonValue>,
        description: &str,
    ) -> Result<(), AuditWriteError> {
        let entry = AuditEntry::new(category, action, actor_id, description.to_string())
            .with_before(before)
            .with_after(after);
        self.insert(&entry)?;
        Ok(())
    }
}

#[async_trait]
impl RecordPurger for AuditLogRepository {
    async fn purge_older_than(&self, threshold: NaiveDateTime) -> Result<usize, PurgeCategoryError> {
        Ok(AuditLogRepository::purge_older_than(self, threshold)?)
    }
}
