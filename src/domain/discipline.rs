// ==========================================
// ArcFlow 预算引擎 - 学科与学科配置领域模型
// ==========================================
// 职责: 学科目录条目、租户级学科配置、租户预算配置
// 红线: ARQUITETURA 永远启用,不可停用
// ==========================================

use crate::domain::types::{DisciplineCategory, DisciplineCode, PricingMode};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// Discipline - 学科目录条目（运行期不可变）
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discipline {
    pub code: DisciplineCode,
    pub name: &'static str,
    pub category: DisciplineCategory,
    pub dependencies: &'static [DisciplineCode],
    pub incompatibilities: &'static [DisciplineCode],
    pub default_pricing_mode: PricingMode,
    /// 含义随计价模式变化: 固定金额 / 每平米单价 / 小时费率
    pub base_value: f64,
    /// 每平米预估工时
    pub base_hours: f64,
}

impl Discipline {
    pub fn is_essential(&self) -> bool {
        self.category == DisciplineCategory::Essential
    }
}

// ==========================================
// DisciplineConfig - 租户级学科覆写
// ==========================================
// 每次保存整体替换,不做跨保存的字段合并
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisciplineConfig {
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub custom_value: Option<f64>,
    /// 学科自定义工期（天）
    #[serde(default)]
    pub custom_deadline: Option<u32>,
    #[serde(default)]
    pub complexity_multiplier: Option<f64>,
    #[serde(default)]
    pub pricing_mode: Option<PricingMode>,
    /// 按小时计价时的总工时覆写
    #[serde(default)]
    pub custom_hours: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl Default for DisciplineConfig {
    fn default() -> Self {
        Self {
            active: true,
            custom_value: None,
            custom_deadline: None,
            complexity_multiplier: None,
            pricing_mode: None,
            custom_hours: None,
        }
    }
}

// ==========================================
// BudgetConfiguration - 租户预算配置
// ==========================================
// 对齐: budget_configuration 表 (tenant_id 主键)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetConfiguration {
    pub tenant_id: String,
    pub active_disciplines: BTreeSet<DisciplineCode>,
    pub configs_by_discipline: BTreeMap<DisciplineCode, DisciplineConfig>,
    pub updated_at: NaiveDateTime,
}

impl BudgetConfiguration {
    /// 默认配置: 仅启用 ARQUITETURA, 无覆写
    pub fn default_for(tenant_id: &str) -> Self {
        let mut active = BTreeSet::new();
        active.insert(DisciplineCode::ESSENTIAL);
        Self {
            tenant_id: tenant_id.to_string(),
            active_disciplines: active,
            configs_by_discipline: BTreeMap::new(),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn is_active(&self, code: DisciplineCode) -> bool {
        self.active_disciplines.contains(&code)
    }

    pub fn config_for(&self, code: DisciplineCode) -> Option<&DisciplineConfig> {
        self.configs_by_discipline.get(&code)
    }
}

// ==========================================
// ConfigurationView - 读取结果
// ==========================================
// was_defaulted=true 表示租户尚未保存过配置,返回的是默认配置
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationView {
    pub configuration: BudgetConfiguration,
    pub was_defaulted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration_contains_essential() {
        let config = BudgetConfiguration::default_for("office-1");
        assert!(config.is_active(DisciplineCode::Arquitetura));
        assert_eq!(config.active_disciplines.len(), 1);
        assert!(config.configs_by_discipline.is_empty());
    }

    #[test]
    fn test_discipline_config_deserialize_defaults_active() {
        let cfg: DisciplineConfig = serde_json::from_str(r#"{"customValue": 95.5}"#).unwrap();
        assert!(cfg.active);
        assert_eq!(cfg.custom_value, Some(95.5));
        assert_eq!(cfg.pricing_mode, None);
    }
}
