// ==========================================
// ArcFlow - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/Engine错误为用户友好的错误消息
// 约定: 所有错误信息必须包含显式原因; 校验错误携带字段级明细
// ==========================================

use crate::engine::budget_calculator::CalculationError;
use crate::engine::discipline_rules::RuleViolation;
use crate::engine::scheduler::SchedulerError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 预算配置校验失败（带字段级明细）
    #[error("配置校验失败: {reason}")]
    ConfigurationValidation {
        reason: String,
        violations: Vec<ValidationViolation>,
    },

    // ==========================================
    // 预算计算错误
    // ==========================================
    #[error("无效参数 (field={field}): {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("系数表 {table} 中不存在键: {key}")]
    LookupError { table: String, key: String },

    // ==========================================
    // 调度错误
    // ==========================================
    #[error("调度配置无效: {0}")]
    SchedulerConfigError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::SerializationError(msg) => {
                ApiError::InternalError(format!("序列化失败: {}", msg))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 CalculationError 转换
// ==========================================
impl From<CalculationError> for ApiError {
    fn from(err: CalculationError) -> Self {
        match err {
            CalculationError::InvalidParameter { field, reason } => {
                ApiError::InvalidParameter { field, reason }
            }
            CalculationError::InvalidConfiguration { reason, violations } => {
                ApiError::ConfigurationValidation {
                    reason,
                    violations: violations.into_iter().map(ValidationViolation::from).collect(),
                }
            }
            CalculationError::Lookup { table, key } => ApiError::LookupError { table, key },
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        ApiError::SchedulerConfigError(err.to_string())
    }
}

impl ApiError {
    /// 由规则违规列表构造校验错误
    pub fn configuration_validation(violations: Vec<RuleViolation>) -> Self {
        let reason = violations
            .iter()
            .map(|v| v.reason.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        ApiError::ConfigurationValidation {
            reason,
            violations: violations.into_iter().map(ValidationViolation::from).collect(),
        }
    }

    /// 字段级明细（非校验错误返回空）
    pub fn violations(&self) -> &[ValidationViolation] {
        match self {
            ApiError::ConfigurationValidation { violations, .. } => violations,
            _ => &[],
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 校验违规详情
// ==========================================

/// 校验违规详情
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationViolation {
    /// 违规类型（ESSENTIAL_MISSING / DEPENDENCY_MISSING / INCOMPATIBLE ...）
    pub violation_type: String,
    /// 违规字段
    pub field: String,
    /// 学科代码
    pub discipline: Option<String>,
    /// 违规原因
    pub reason: String,
}

impl From<RuleViolation> for ValidationViolation {
    fn from(v: RuleViolation) -> Self {
        Self {
            violation_type: v.kind.as_str().to_string(),
            field: v.field,
            discipline: v.discipline,
            reason: v.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "BudgetConfiguration".to_string(),
            id: "office-1".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("BudgetConfiguration"));
                assert!(msg.contains("office-1"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::DatabaseConnectionError(_)));
    }

    #[test]
    fn test_calculation_error_conversion() {
        let api_err: ApiError = CalculationError::Lookup {
            table: "region".to_string(),
            key: "marte".to_string(),
        }
        .into();
        match api_err {
            ApiError::LookupError { table, key } => {
                assert_eq!(table, "region");
                assert_eq!(key, "marte");
            }
            _ => panic!("Expected LookupError"),
        }
    }

    #[test]
    fn test_configuration_validation_keeps_field_detail() {
        let set = [crate::domain::types::DisciplineCode::Estrutural]
            .into_iter()
            .collect();
        let violations = crate::engine::discipline_rules::validate_active_set(&set);
        let err = ApiError::configuration_validation(violations);

        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].violation_type, "ESSENTIAL_MISSING");
        assert_eq!(err.violations()[0].field, "activeDisciplines");
        assert!(err.to_string().contains("ARQUITETURA"));
    }
}
