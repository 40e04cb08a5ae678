// ==========================================
// ArcFlow - 预算版本历史领域模型
// ==========================================
// 每次“计算并记录”生成一个版本, 版本号按 (tenant_id, budget_id) 递增
// 对齐: budget_version_history 表
// 生命周期: 只追加, 由数据保留任务按 created_at 清理
// ==========================================

use crate::domain::budget::{BudgetResult, ProjectParameters};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetVersion {
    pub version_id: String,
    pub tenant_id: String,
    pub budget_id: String,
    pub version_no: i64,
    pub parameters: ProjectParameters,
    pub result: BudgetResult,
    pub created_by: String,
    pub created_at: NaiveDateTime,
}

impl BudgetVersion {
    /// 创建待写入版本（version_no 由仓储分配）
    pub fn draft(
        tenant_id: &str,
        budget_id: &str,
        parameters: ProjectParameters,
        result: BudgetResult,
        created_by: &str,
    ) -> Self {
        Self {
            version_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            budget_id: budget_id.to_string(),
            version_no: 0,
            parameters,
            result,
            created_by: created_by.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn total_value(&self) -> f64 {
        self.result.total_value
    }
}
