// ==========================================
// ArcFlow - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 约定: 缺失或格式错误的配置回退默认值并告警, 不阻断业务
// ==========================================

use crate::config::pricing_tables::{normalize_key, IndirectCostRates, PricingTables};
use crate::config::retention_settings::RetentionSettings;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 全局作用域
pub const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）并确保 config_kv 存在。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            conn_guard.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS config_kv (
                  scope_id TEXT NOT NULL,
                  key TEXT NOT NULL,
                  value TEXT NOT NULL,
                  updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                  PRIMARY KEY (scope_id, key)
                );
                "#,
            )?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn update_config(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        if key.trim().is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![GLOBAL_SCOPE, key.trim(), value],
        )?;
        Ok(())
    }

    /// 解析数值配置; 缺失取默认, 格式错误告警并取默认
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    "配置格式错误，使用默认值 {}",
                    default
                );
                Ok(default)
            }
        }
    }

    /// 解析系数表配置 (JSON 对象: {"sudeste": 1.1, ...})
    fn get_multiplier_table(
        &self,
        key: &str,
        default: BTreeMap<String, f64>,
    ) -> Result<BTreeMap<String, f64>, Box<dyn Error>> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match serde_json::from_str::<BTreeMap<String, f64>>(&raw) {
            Ok(table) => Ok(table
                .into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .collect()),
            Err(e) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    "系数表配置格式错误，使用默认表: {}",
                    e
                );
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 预算计价参数 =====

    /// 获取计价参数表（系数表 + 间接费率 + 项目工期）
    pub fn get_pricing_tables(&self) -> Result<PricingTables, Box<dyn Error>> {
        let defaults = PricingTables::default();
        let rates = IndirectCostRates::default();

        Ok(PricingTables {
            regional_multipliers: self
                .get_multiplier_table(config_keys::REGIONAL_MULTIPLIERS, defaults.regional_multipliers)?,
            standard_multipliers: self
                .get_multiplier_table(config_keys::STANDARD_MULTIPLIERS, defaults.standard_multipliers)?,
            complexity_multipliers: self
                .get_multiplier_table(config_keys::COMPLEXITY_MULTIPLIERS, defaults.complexity_multipliers)?,
            indirect: IndirectCostRates {
                overhead_pct: self.get_parsed_or_default(config_keys::OVERHEAD_PCT, rates.overhead_pct)?,
                contingency_pct: self
                    .get_parsed_or_default(config_keys::CONTINGENCY_PCT, rates.contingency_pct)?,
                commission_pct: self
                    .get_parsed_or_default(config_keys::COMMISSION_PCT, rates.commission_pct)?,
                margin_pct: self.get_parsed_or_default(config_keys::MARGIN_PCT, rates.margin_pct)?,
                taxes_pct: self.get_parsed_or_default(config_keys::TAXES_PCT, rates.taxes_pct)?,
            },
            project_duration_days: self
                .get_parsed_or_default(config_keys::PROJECT_DURATION_DAYS, defaults.project_duration_days)?,
        })
    }

    // ===== 数据保留任务 =====

    /// 获取数据保留任务配置
    pub fn get_retention_settings(&self) -> Result<RetentionSettings, Box<dyn Error>> {
        let defaults = RetentionSettings::default();

        let enabled = match self.get_config_value(config_keys::RETENTION_ENABLED)? {
            Some(raw) => matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"),
            None => defaults.enabled,
        };

        let cron_expression = self
            .get_config_value(config_keys::RETENTION_CRON)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.cron_expression);

        let timezone = self
            .get_config_value(config_keys::RETENTION_TIMEZONE)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.timezone);

        Ok(RetentionSettings {
            enabled,
            cron_expression,
            timezone,
            budget_history_months: self.get_parsed_or_default(
                config_keys::RETENTION_BUDGET_HISTORY_MONTHS,
                defaults.budget_history_months,
            )?,
            audit_log_months: self
                .get_parsed_or_default(config_keys::RETENTION_AUDIT_LOG_MONTHS, defaults.audit_log_months)?,
            app_log_months: self
                .get_parsed_or_default(config_keys::RETENTION_APP_LOG_MONTHS, defaults.app_log_months)?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 系数表 (JSON 对象)
    pub const REGIONAL_MULTIPLIERS: &str = "budget/regional_multipliers";
    pub const STANDARD_MULTIPLIERS: &str = "budget/standard_multipliers";
    pub const COMPLEXITY_MULTIPLIERS: &str = "budget/complexity_multipliers";

    // 间接费率（百分数）
    pub const OVERHEAD_PCT: &str = "budget/overhead_pct";
    pub const CONTINGENCY_PCT: &str = "budget/contingency_pct";
    pub const COMMISSION_PCT: &str = "budget/commission_pct";
    pub const MARGIN_PCT: &str = "budget/margin_pct";
    pub const TAXES_PCT: &str = "budget/taxes_pct";

    // 项目标准工期（天）
    pub const PROJECT_DURATION_DAYS: &str = "budget/project_duration_days";

    // 数据保留任务
    pub const RETENTION_ENABLED: &str = "retention/enabled";
    pub const RETENTION_CRON: &str = "retention/cron";
    pub const RETENTION_TIMEZONE: &str = "retention/timezone";
    pub const RETENTION_BUDGET_HISTORY_MONTHS: &str = "retention/budget_history_months";
    pub const RETENTION_AUDIT_LOG_MONTHS: &str = "retention/audit_log_months";
    pub const RETENTION_APP_LOG_MONTHS: &str = "retention/app_log_months";
}
