// ==========================================
// ArcFlow - 应用运行日志仓储
// ==========================================
// 对齐: app_log 表
// 红线: 写入失败不得影响业务调用 (由调用方降级为 tracing 日志)
// ==========================================

use crate::domain::app_log::{AppLogEntry, AppLogLevel};
use crate::engine::retention::{PurgeCategoryError, RecordPurger};
use crate::repository::error::{parse_db_datetime, RepositoryError, RepositoryResult, DB_DATETIME_FORMAT};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct AppLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AppLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        if let Err(e) = repo.ensure_table_and_indexes() {
            tracing::warn!("app_log ensure failed: {}", e);
        }
        repo
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table_and_indexes(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS app_log (
              log_id TEXT PRIMARY KEY,
              level TEXT NOT NULL,
              target TEXT NOT NULL,
              tenant_id TEXT,
              message TEXT NOT NULL,
              created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_app_log_created_at ON app_log(created_at);
            "#,
        )?;
        Ok(())
    }

    pub fn append(&self, entry: &AppLogEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO app_log (log_id, level, target, tenant_id, message, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.log_id,
                entry.level.as_str(),
                entry.target,
                entry.tenant_id,
                entry.message,
                entry.created_at.format(DB_DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 最近的日志（新在前）
    pub fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<AppLogEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, level, target, tenant_id, message, created_at
            FROM app_log
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;
        let entries = stmt
            .query_map(params![limit as i64], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn purge_older_than(&self, threshold: NaiveDateTime) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM app_log WHERE created_at < ?1",
            params![threshold.format(DB_DATETIME_FORMAT).to_string()],
        )?;
        Ok(rows)
    }
}

#[async_trait]
impl RecordPurger for AppLogRepository {
    async fn purge_older_than(&self, threshold: NaiveDateTime) -> Result<usize, PurgeCategoryError> {
        Ok(AppLogRepository::purge_older_than(self, threshold)?)
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<AppLogEntry> {
    let level_raw: String = row.get(1)?;
    let created_raw: String = row.get(5)?;

    let level = AppLogLevel::parse(&level_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("未知日志级别: {}", level_raw).into(),
        )
    })?;

    Ok(AppLogEntry {
        log_id: row.get(0)?,
        level,
        target: row.get(2)?,
        tenant_id: row.get(3)?,
        message: row.get(4)?,
        created_at: parse_db_datetime(5, &created_raw)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn setup_repo() -> AppLogRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        AppLogRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_append_and_find_recent() {
        let repo = setup_repo();
        repo.append(&AppLogEntry::new(AppLogLevel::Info, "budget_api", Some("office-1"), "ok".to_string()))
            .unwrap();
        repo.append(&AppLogEntry::new(AppLogLevel::Error, "budget_api", None, "boom".to_string()))
            .unwrap();

        let recent = repo.find_recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].level, AppLogLevel::Error);
        assert_eq!(recent[1].tenant_id.as_deref(), Some("office-1"));
    }

    #[tokio::test]
    async fn test_purge_through_trait() {
        let repo = setup_repo();
        let mut old = AppLogEntry::new(AppLogLevel::Warn, "retention", None, "old".to_string());
        old.created_at = Utc::now().naive_utc() - Duration::days(400);
        repo.append(&old).unwrap();
        repo.append(&AppLogEntry::new(AppLogLevel::Info, "retention", None, "new".to_string()))
            .unwrap();

        let threshold = Utc::now().naive_utc() - Duration::days(180);
        let removed = RecordPurger::purge_older_than(&repo, threshold).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(repo.find_recent(10).unwrap().len(), 1);
    }
}
