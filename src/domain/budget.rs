// ==========================================
// ArcFlow 预算引擎 - 预算输入/输出领域模型
// ==========================================
// 输入: 项目参数 (briefing/项目界面提供)
// 输出: 预算结果 (提案/PDF 渲染层消费)
// ==========================================

use crate::domain::types::{DisciplineCode, PhaseCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ProjectParameters - 项目参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectParameters {
    pub built_area: f64,
    pub region: String,
    pub construction_standard: String,
    pub complexity: String,
    pub active_disciplines: Vec<String>,
}

// ==========================================
// BudgetBreakdown - 间接费用分解
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetBreakdown {
    pub subtotal: f64,
    pub overhead: f64,
    pub contingency: f64,
    pub commission: f64,
    pub margin: f64,
    pub taxes: f64,
}

// ==========================================
// SchedulePhase - 阶段进度（派生视图,不单独持久化）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePhase {
    pub order: u32,
    pub stage_code: PhaseCode,
    pub name: String,
    pub duration_days: u32,
    pub value: f64,
    pub percent_of_total: f64,
    pub disciplines: Vec<DisciplineCode>,
    pub deliverables: Vec<String>,
    pub active: bool,
}

// ==========================================
// BudgetResult - 预算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetResult {
    pub total_value: f64,
    pub value_per_square_meter: f64,
    pub discipline_values: BTreeMap<DisciplineCode, f64>,
    pub breakdown: BudgetBreakdown,
    pub schedule: Vec<SchedulePhase>,
    pub total_duration_days: u32,
}

impl BudgetResult {
    /// 启用阶段列表
    pub fn active_phases(&self) -> impl Iterator<Item = &SchedulePhase> {
        self.schedule.iter().filter(|p| p.active)
    }
}
