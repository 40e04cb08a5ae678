// ==========================================
// ArcFlow - 计价参数表
// ==========================================
// 存储位置: config_kv (scope_id='global', key='budget/*')
// 用途: 预算计算的地区/标准/复杂度系数与间接费率
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 地区系数表名（用于 LookupError）
pub const TABLE_REGION: &str = "region";
/// 建造标准系数表名
pub const TABLE_STANDARD: &str = "constructionStandard";
/// 复杂度系数表名
pub const TABLE_COMPLEXITY: &str = "complexity";

// ==========================================
// IndirectCostRates - 间接费率（百分数, 10.0 即 10%）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndirectCostRates {
    pub overhead_pct: f64,
    pub contingency_pct: f64,
    pub commission_pct: f64,
    pub margin_pct: f64,
    pub taxes_pct: f64,
}

impl Default for IndirectCostRates {
    fn default() -> Self {
        Self {
            overhead_pct: 10.0,
            contingency_pct: 5.0,
            commission_pct: 0.0,
            margin_pct: 15.0,
            taxes_pct: 8.0,
        }
    }
}

// ==========================================
// PricingTables - 计价参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTables {
    pub regional_multipliers: BTreeMap<String, f64>,
    pub standard_multipliers: BTreeMap<String, f64>,
    pub complexity_multipliers: BTreeMap<String, f64>,
    pub indirect: IndirectCostRates,
    /// 项目标准总工期（天）
    pub project_duration_days: u32,
}

impl PricingTables {
    /// 查询系数; 键名大小写与首尾空白不敏感
    pub fn lookup(&self, table: &str, key: &str) -> Option<f64> {
        let map = match table {
            TABLE_REGION => &self.regional_multipliers,
            TABLE_STANDARD => &self.standard_multipliers,
            TABLE_COMPLEXITY => &self.complexity_multipliers,
            _ => return None,
        };
        map.get(&normalize_key(key)).copied()
    }
}

/// 系数表键名归一化
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

pub fn default_regional_multipliers() -> BTreeMap<String, f64> {
    [
        ("default", 1.0),
        ("norte", 0.95),
        ("nordeste", 0.9),
        ("centro_oeste", 1.0),
        ("sudeste", 1.1),
        ("sul", 1.05),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

pub fn default_standard_multipliers() -> BTreeMap<String, f64> {
    [("low", 0.85), ("medium", 1.0), ("high", 1.25), ("luxury", 1.5)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub fn default_complexity_multipliers() -> BTreeMap<String, f64> {
    [("low", 0.9), ("medium", 1.0), ("high", 1.2), ("very_high", 1.4)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// 默认项目总工期（天）
pub const DEFAULT_PROJECT_DURATION_DAYS: u32 = 120;

impl Default for PricingTables {
    fn default() -> Self {
        Self {
            regional_multipliers: default_regional_multipliers(),
            standard_multipliers: default_standard_multipliers(),
            complexity_multipliers: default_complexity_multipliers(),
            indirect: IndirectCostRates::default(),
            project_duration_days: DEFAULT_PROJECT_DURATION_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let tables = PricingTables::default();
        assert_eq!(tables.lookup(TABLE_REGION, " Sudeste "), Some(1.1));
        assert_eq!(tables.lookup(TABLE_STANDARD, "MEDIUM"), Some(1.0));
        assert_eq!(tables.lookup(TABLE_COMPLEXITY, "unknown"), None);
        assert_eq!(tables.lookup("other_table", "default"), None);
    }
}
