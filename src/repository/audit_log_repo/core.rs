use crate::domain::audit_log::AuditEntry;
use crate::repository::error::{RepositoryError, RepositoryResult, DB_DATETIME_FORMAT};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// AuditLogRepository - 审计日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
    /// 创建新的审计日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        if let Err(e) = repo.ensure_table_and_indexes() {
            tracing::warn!("audit_log ensure failed: {}", e);
        }
        repo
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table_and_indexes(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
              audit_id TEXT PRIMARY KEY,
              category TEXT NOT NULL,
              action TEXT NOT NULL,
              actor_id TEXT NOT NULL,
              before_json TEXT,
              after_json TEXT,
              description TEXT NOT NULL,
              created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_audit_log_category ON audit_log(category, created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_audit_log_created_at ON audit_log(created_at);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入审计条目
    ///
    /// # 返回
    /// - `Ok(audit_id)`: 成功插入
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, entry: &AuditEntry) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO audit_log (
                audit_id, category, action, actor_id,
                before_json, after_json, description, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                entry.audit_id,
                entry.category,
                entry.action,
                entry.actor_id,
                entry.before_json.as_ref().map(|v| v.to_string()),
                entry.after_json.as_ref().map(|v| v.to_string()),
                entry.description,
                entry.created_at.format(DB_DATETIME_FORMAT).to_string(),
            ],
        )?;

        Ok(entry.audit_id.clone())
    }

    /// 删除早于阈值的审计条目
    pub fn purge_older_than(&self, threshold: NaiveDateTime) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM audit_log WHERE created_at < ?1",
            params![threshold.format(DB_DATETIME_FORMAT).to_string()],
        )?;
        Ok(rows)
    }
}
