// ==========================================
// ArcFlow - 预算版本历史仓储
// ==========================================
// 对齐: budget_version_history 表
// 约束: (tenant_id, budget_id, version_no) 唯一, 版本号在事务内分配
// ==========================================

use crate::domain::budget_version::BudgetVersion;
use crate::engine::retention::{PurgeCategoryError, RecordPurger};
use crate::repository::error::{parse_db_datetime, RepositoryError, RepositoryResult, DB_DATETIME_FORMAT};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct BudgetHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BudgetHistoryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        if let Err(e) = repo.ensure_table_and_indexes() {
            tracing::warn!("budget_version_history ensure failed: {}", e);
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
            CREATE TABLE IF NOT EXISTS budget_version_history (
              version_id TEXT PRIMARY KEY,
              tenant_id TEXT NOT NULL,
              budget_id TEXT NOT NULL,
              version_no INTEGER NOT NULL,
              parameters_json TEXT NOT NULL,
              result_json TEXT NOT NULL,
              total_value REAL NOT NULL,
              created_by TEXT NOT NULL,
              created_at TEXT NOT NULL,
              UNIQUE(tenant_id, budget_id, version_no)
            );
            CREATE INDEX IF NOT EXISTS idx_budget_history_budget ON budget_version_history(tenant_id, budget_id, version_no DESC);
            CREATE INDEX IF NOT EXISTS idx_budget_history_created_at ON budget_version_history(created_at);
            "#,
        )?;
        Ok(())
    }

    /// 写入新版本, 分配下一个版本号
    ///
    /// # 返回
    /// 带已分配 version_no 的版本
    pub fn insert_next_version(&self, version: &BudgetVersion) -> RepositoryResult<BudgetVersion> {
        let parameters_json = serde_json::to_string(&version.parameters)?;
        let result_json = serde_json::to_string(&version.result)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let next_no: i64 = tx.query_row(
            r#"
            SELECT COALESCE(MAX(version_no), 0) + 1
            FROM budget_version_history
            WHERE tenant_id = ?1 AND budget_id = ?2
            "#,
            params![version.tenant_id, version.budget_id],
            |row| row.get(0),
        )?;

        tx.execute(
            r#"
            INSERT INTO budget_version_history (
                version_id, tenant_id, budget_id, version_no,
                parameters_json, result_json, total_value, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                version.version_id,
                version.tenant_id,
                version.budget_id,
                next_no,
                parameters_json,
                result_json,
                version.total_value(),
                version.created_by,
                version.created_at.format(DB_DATETIME_FORMAT).to_string(),
            ],
        )?;

        tx.commit()?;

        let mut stored = version.clone();
        stored.version_no = next_no;
        Ok(stored)
    }

    /// 按预算查询全部版本（新版本在前）
    pub fn list_by_budget(&self, tenant_id: &str, budget_id: &str) -> RepositoryResult<Vec<BudgetVersion>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT version_id, tenant_id, budget_id, version_no,
                   parameters_json, result_json, created_by, created_at
            FROM budget_version_history
            WHERE tenant_id = ?1 AND budget_id = ?2
            ORDER BY version_no DESC
            "#,
        )?;

        let versions = stmt
            .query_map(params![tenant_id, budget_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(versions)
    }

    /// 删除早于阈值的版本
    pub fn purge_older_than(&self, threshold: NaiveDateTime) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM budget_version_history WHERE created_at < ?1",
            params![threshold.format(DB_DATETIME_FORMAT).to_string()],
        )?;
        Ok(rows)
    }
}

#[async_trait]
impl RecordPurger for BudgetHistoryRepository {
    async fn purge_older_than(&self, threshold: NaiveDateTime) -> Result<usize, PurgeCategoryError> {
        Ok(BudgetHistoryRepository::purge_older_than(self, threshold)?)
    }
}

fn json_column<T: serde::de::DeserializeOwned>(idx: usize, raw: &str) -> SqliteResult<T> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_row(row: &Row<'_>) -> SqliteResult<BudgetVersion> {
    let parameters_raw: String = row.get(4)?;
    let result_raw: String = row.get(5)?;
    let created_raw: String = row.get(7)?;

    Ok(BudgetVersion {
        version_id: row.get(0)?,
        tenant_id: row.get(1)?,
        budget_id: row.get(2)?,
        version_no: row.get(3)?,
        parameters: json_column(4, &parameters_raw)?,
        result: json_column(5, &result_raw)?,
        created_by: row.get(6)?,
        created_at: parse_db_datetime(7, &created_raw)?,
    })
}
