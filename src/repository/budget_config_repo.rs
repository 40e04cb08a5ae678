// ==========================================
// ArcFlow - 租户预算配置仓储
// ==========================================
// 对齐: budget_configuration 表 (tenant_id 主键)
// 红线: Repository 不做业务校验,只做数据映射
// 红线: 保存为整体替换 (upsert 单语句),不做字段级合并
// ==========================================

use crate::domain::discipline::{BudgetConfiguration, DisciplineConfig};
use crate::domain::types::DisciplineCode;
use crate::repository::error::{parse_db_datetime, RepositoryError, RepositoryResult, DB_DATETIME_FORMAT};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

pub struct BudgetConfigRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BudgetConfigRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        // best-effort: 建表失败不阻断启动, 使用时再暴露错误
        if let Err(e) = repo.ensure_table_and_indexes() {
            tracing::warn!("budget_configuration ensure failed: {}", e);
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
            CREATE TABLE IF NOT EXISTS budget_configuration (
              tenant_id TEXT PRIMARY KEY,
              active_disciplines_json TEXT NOT NULL,
              configs_json TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_budget_configuration_updated_at ON budget_configuration(updated_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// 按租户查询配置（未保存过返回 None）
    pub fn find_by_tenant(&self, tenant_id: &str) -> RepositoryResult<Option<BudgetConfiguration>> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                r#"
                SELECT tenant_id, active_disciplines_json, configs_json, updated_at
                FROM budget_configuration
                WHERE tenant_id = ?1
                "#,
                params![tenant_id],
                map_row,
            )
            .optional()?;
        Ok(found)
    }

    /// 写入配置（按租户整体替换）
    pub fn upsert(&self, config: &BudgetConfiguration) -> RepositoryResult<()> {
        let active_json = serde_json::to_string(&config.active_disciplines)?;
        let configs_json = serde_json::to_string(&config.configs_by_discipline)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO budget_configuration (tenant_id, active_disciplines_json, configs_json, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(tenant_id) DO UPDATE SET
              active_disciplines_json = excluded.active_disciplines_json,
              configs_json = excluded.configs_json,
              updated_at = excluded.updated_at
            "#,
            params![
                config.tenant_id,
                active_json,
                configs_json,
                config.updated_at.format(DB_DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 删除配置
    ///
    /// # 返回
    /// - `Ok(true)`: 删除了一行
    /// - `Ok(false)`: 租户本无配置
    pub fn delete(&self, tenant_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM budget_configuration WHERE tenant_id = ?1",
            params![tenant_id],
        )?;
        Ok(rows > 0)
    }

    /// 已保存配置的租户数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM budget_configuration", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<BudgetConfiguration> {
    let active_raw: String = row.get(1)?;
    let configs_raw: String = row.get(2)?;
    let updated_raw: String = row.get(3)?;

    let active_disciplines: BTreeSet<DisciplineCode> = serde_json::from_str(&active_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let configs_by_discipline: BTreeMap<DisciplineCode, DisciplineConfig> =
        serde_json::from_str(&configs_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(BudgetConfiguration {
        tenant_id: row.get(0)?,
        active_disciplines,
        configs_by_discipline,
        updated_at: parse_db_datetime(3, &updated_raw)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup_repo() -> BudgetConfigRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        BudgetConfigRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn sample(tenant: &str) -> BudgetConfiguration {
        let mut config = BudgetConfiguration::default_for(tenant);
        config.active_disciplines.insert(DisciplineCode::Estrutural);
        config.configs_by_discipline.insert(
            DisciplineCode::Estrutural,
            DisciplineConfig {
                custom_value: Some(40.0),
                custom_deadline: Some(150),
                ..DisciplineConfig::default()
            },
        );
        config.updated_at = NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        config
    }

    #[test]
    fn test_upsert_and_find() {
        let repo = setup_repo();
        assert!(repo.find_by_tenant("office-1").unwrap().is_none());

        let config = sample("office-1");
        repo.upsert(&config).unwrap();

        let found = repo.find_by_tenant("office-1").unwrap().unwrap();
        assert_eq!(found, config);
    }

    #[test]
    fn test_upsert_replaces_whole_row() {
        let repo = setup_repo();
        repo.upsert(&sample("office-1")).unwrap();

        let replacement = BudgetConfiguration::default_for("office-1");
        repo.upsert(&replacement).unwrap();

        let found = repo.find_by_tenant("office-1").unwrap().unwrap();
        assert_eq!(found.active_disciplines.len(), 1);
        assert!(found.configs_by_discipline.is_empty());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let repo = setup_repo();
        repo.upsert(&sample("office-1")).unwrap();

        assert!(repo.delete("office-1").unwrap());
        assert!(!repo.delete("office-1").unwrap());
        assert!(repo.find_by_tenant("office-1").unwrap().is_none());
    }

    #[test]
    fn test_tenants_are_isolated() {
        let repo = setup_repo();
        repo.upsert(&sample("office-1")).unwrap();
        repo.upsert(&BudgetConfiguration::default_for("office-2")).unwrap();

        repo.delete("office-2").unwrap();
        assert!(repo.find_by_tenant("office-1").unwrap().is_some());
    }
}
