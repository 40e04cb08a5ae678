use super::core::AuditLogRepository;
use crate::domain::audit_log::AuditEntry;
use crate::repository::error::{parse_db_datetime, RepositoryResult};
use rusqlite::{params, Result as SqliteResult, Row};
use serde_json::Value as JsonValue;

impl AuditLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 audit_id 查询单条
    pub fn find_by_id(&self, audit_id: &str) -> RepositoryResult<Option<AuditEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT audit_id, category, action, actor_id,
                   before_json, after_json, description, created_at
            FROM audit_log
            WHERE audit_id = ?
            "#,
        )?;

        match stmt.query_row(params![audit_id], map_row) {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按类别查询最近的审计条目
    pub fn find_by_category(&self, category: &str, limit: usize) -> RepositoryResult<Vec<AuditEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT audit_id, category, action, actor_id,
                   before_json, after_json, description, created_at
            FROM audit_log
            WHERE category = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )?;

        let entries = stmt
            .query_map(params![category, limit as i64], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(entries)
    }

    /// 查询最近的审计条目
    pub fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<AuditEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT audit_id, category, action, actor_id,
                   before_json, after_json, description, created_at
            FROM audit_log
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )?;

        let entries = stmt
            .query_map(params![limit as i64], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(entries)
    }

    /// 统计条目数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

// ==========================================
// 辅助方法
// ==========================================

fn parse_json_column(idx: usize, raw: Option<String>) -> SqliteResult<Option<JsonValue>> {
    match raw {
        Some(s) => serde_json::from_str(&s).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        }),
        None => Ok(None),
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<AuditEntry> {
    let created_raw: String = row.get(7)?;

    Ok(AuditEntry {
        audit_id: row.get(0)?,
        category: row.get(1)?,
        action: row.get(2)?,
        actor_id: row.get(3)?,
        before_json: parse_json_column(4, row.get(4)?)?,
        after_json: parse_json_column(5, row.get(5)?)?,
        description: row.get(6)?,
        created_at: parse_db_datetime(7, &created_raw)?,
    })
}
