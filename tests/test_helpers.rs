// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、AppState 装配、测试数据构造
// ==========================================

#![allow(dead_code)]

use arcflow_core::app::AppState;
use arcflow_core::domain::{AppLogEntry, AppLogLevel, AuditEntry, ProjectParameters};
use chrono::{Months, NaiveDateTime, Utc};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库文件
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是有效 UTF-8")?
        .to_string();
    Ok((temp_file, db_path))
}

/// 基于临时数据库装配 AppState
pub fn create_test_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let state = AppState::new(db_path)?;
    Ok((temp_file, state))
}

/// 项目参数 (default / medium / medium)
pub fn project_params(area: f64, disciplines: &[&str]) -> ProjectParameters {
    ProjectParameters {
        built_area: area,
        region: "default".to_string(),
        construction_standard: "medium".to_string(),
        complexity: "medium".to_string(),
        active_disciplines: disciplines.iter().map(|s| s.to_string()).collect(),
    }
}

/// 当前时间往前 months 个月
pub fn months_ago(months: u32) -> NaiveDateTime {
    let now = Utc::now();
    now.checked_sub_months(Months::new(months))
        .unwrap_or(now)
        .naive_utc()
}

pub fn aged_audit_entry(months: u32) -> AuditEntry {
    let mut entry = AuditEntry::new("budget_configuration", "CONFIGURATION_SAVE", "alice", "旧审计".to_string());
    entry.created_at = months_ago(months);
    entry
}

pub fn aged_app_log(months: u32) -> AppLogEntry {
    let mut entry = AppLogEntry::new(AppLogLevel::Info, "budget_api", Some("office-1"), "旧日志".to_string());
    entry.created_at = months_ago(months);
    entry
}
