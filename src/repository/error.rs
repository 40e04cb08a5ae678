// ==========================================
// ArcFlow - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::engine::retention::{AuditWriteError, PurgeCategoryError};
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    // ===== 数据格式错误 =====
    #[error("序列化失败: {0}")]
    SerializationError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

// 清理例程协作者错误 (仓储实现 RecordPurger / AuditSink 时使用)
impl From<RepositoryError> for PurgeCategoryError {
    fn from(err: RepositoryError) -> Self {
        PurgeCategoryError(err.to_string())
    }
}

impl From<RepositoryError> for AuditWriteError {
    fn from(err: RepositoryError) -> Self {
        AuditWriteError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// 数据库时间戳格式（UTC）
pub const DB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 解析数据库时间戳列
pub(crate) fn parse_db_datetime(
    idx: usize,
    raw: &str,
) -> rusqlite::Result<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(raw, DB_DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_errors_keep_message() {
        let purge: PurgeCategoryError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(purge.0.contains("poisoned"));

        let audit: AuditWriteError =
            RepositoryError::from(rusqlite::Error::QueryReturnedNoRows).into();
        assert!(audit.0.contains("记录未找到"));
    }
}
