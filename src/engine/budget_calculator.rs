// ==========================================
// ArcFlow 预算引擎 - 预算计算器
// ==========================================
// 输入: 项目参数 + 租户预算配置 + 计价参数表
// 输出: 总价、学科分项、间接费用分解、阶段进度
// ==========================================
// 红线: 纯函数, 无隐藏状态; 相同输入必须得到完全相同的输出
// 红线: 参数/配置/查表错误必须在任何计算开始前拒绝
// ==========================================
// 间接费用叠加顺序（固定）:
//   overhead    = subtotal × overhead%
//   contingency = subtotal × contingency%
//   running     = subtotal + overhead + contingency
//   commission  = running × commission%      ; running += commission
//   margin      = running × margin%          ; running += margin
//   taxes       = running × taxes%           ; total = running + taxes
// ==========================================

use crate::catalog::disciplines;
use crate::config::pricing_tables::{PricingTables, TABLE_COMPLEXITY, TABLE_REGION, TABLE_STANDARD};
use crate::domain::budget::{BudgetBreakdown, BudgetResult, ProjectParameters};
use crate::domain::discipline::{BudgetConfiguration, DisciplineConfig};
use crate::domain::types::{DisciplineCode, PricingMode};
use crate::engine::discipline_rules::{self, RuleViolation};
use crate::engine::schedule::build_schedule;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::instrument;

// ==========================================
// CalculationError - 计算错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculationError {
    #[error("无效参数 (field={field}): {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("无效学科配置: {reason}")]
    InvalidConfiguration {
        reason: String,
        violations: Vec<RuleViolation>,
    },

    #[error("系数表 {table} 中不存在键: {key}")]
    Lookup { table: String, key: String },
}

// ==========================================
// BudgetCalculator - 预算计算器
// ==========================================
#[derive(Debug, Default)]
pub struct BudgetCalculator {}

impl BudgetCalculator {
    /// 创建新的预算计算器
    pub fn new() -> Self {
        Self {}
    }

    /// 计算预算
    ///
    /// # 参数
    /// - params: 项目参数（启用学科以此为准）
    /// - configuration: 租户预算配置（提供学科覆写）
    /// - tables: 计价参数表
    ///
    /// # 返回
    /// - Ok(BudgetResult): 计算结果
    /// - Err(CalculationError): 参数/配置/查表错误
    #[instrument(skip(self, params, configuration, tables), fields(built_area = params.built_area, tenant = %configuration.tenant_id))]
    pub fn calculate(
        &self,
        params: &ProjectParameters,
        configuration: &BudgetConfiguration,
        tables: &PricingTables,
    ) -> Result<BudgetResult, CalculationError> {
        // 1. 参数与配置校验
        validate_built_area(params.built_area)?;
        let active = resolve_active_set(&params.active_disciplines)?;
        let multipliers = resolve_multipliers(params, tables)?;

        // 2. 学科分项
        let mut discipline_values = BTreeMap::new();
        for code in &active {
            let value = self.discipline_value(
                *code,
                configuration.config_for(*code),
                params.built_area,
                multipliers,
            );
            discipline_values.insert(*code, value);
        }
        let subtotal: f64 = discipline_values.values().sum();

        // 3. 间接费用
        let breakdown = compose_indirect_costs(subtotal, tables);
        let total_value = breakdown_total(&breakdown);

        // 4. 工期与阶段
        let total_duration_days = resolve_total_duration(&active, configuration, tables);
        let schedule = build_schedule(&active, total_value, total_duration_days);

        tracing::debug!(
            subtotal,
            total_value,
            disciplines = active.len(),
            "预算计算完成"
        );

        Ok(BudgetResult {
            total_value,
            value_per_square_meter: total_value / params.built_area,
            discipline_values,
            breakdown,
            schedule,
            total_duration_days,
        })
    }

    /// 单学科金额
    ///
    /// value = 归一化(customValue ?? baseValue) × 地区 × 标准 × 复杂度
    /// 学科配置中的 complexityMultiplier 覆盖复杂度表系数
    pub fn discipline_value(
        &self,
        code: DisciplineCode,
        config: Option<&DisciplineConfig>,
        built_area: f64,
        m: Multipliers,
    ) -> f64 {
        let discipline = disciplines::get(code);

        let mode = config
            .and_then(|c| c.pricing_mode)
            .unwrap_or(discipline.default_pricing_mode);
        let unit_value = config
            .and_then(|c| c.custom_value)
            .unwrap_or(discipline.base_value);

        let normalized = match mode {
            PricingMode::Flat => unit_value,
            PricingMode::PerSquareMeter => unit_value * built_area,
            PricingMode::PerHour => {
                let hours = config
                    .and_then(|c| c.custom_hours)
                    .unwrap_or(discipline.base_hours * built_area);
                unit_value * hours
            }
        };

        let complexity = config
            .and_then(|c| c.complexity_multiplier)
            .unwrap_or(m.complexity);

        normalized * m.regional * m.standard * complexity
    }
}

// ==========================================
// Multipliers - 已解析的系数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multipliers {
    pub regional: f64,
    pub standard: f64,
    pub complexity: f64,
}

// ==========================================
// 校验与查表
// ==========================================

fn validate_built_area(built_area: f64) -> Result<(), CalculationError> {
    if !built_area.is_finite() || built_area <= 0.0 {
        return Err(CalculationError::InvalidParameter {
            field: "builtArea".to_string(),
            reason: format!("建筑面积必须大于0, 实际={}", built_area),
        });
    }
    Ok(())
}

fn resolve_active_set(raw: &[String]) -> Result<BTreeSet<DisciplineCode>, CalculationError> {
    if raw.is_empty() {
        return Err(CalculationError::InvalidConfiguration {
            reason: "启用学科为空".to_string(),
            violations: Vec::new(),
        });
    }

    let (active, mut violations) = discipline_rules::parse_codes(raw, "activeDisciplines");
    violations.extend(discipline_rules::validate_active_set(&active));

    if !violations.is_empty() {
        let reason = violations
            .iter()
            .map(|v| v.reason.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(CalculationError::InvalidConfiguration { reason, violations });
    }

    Ok(active)
}

fn resolve_multipliers(
    params: &ProjectParameters,
    tables: &PricingTables,
) -> Result<Multipliers, CalculationError> {
    let lookup = |table: &str, key: &str| {
        tables
            .lookup(table, key)
            .ok_or_else(|| CalculationError::Lookup {
                table: table.to_string(),
                key: key.to_string(),
            })
    };

    Ok(Multipliers {
        regional: lookup(TABLE_REGION, &params.region)?,
        standard: lookup(TABLE_STANDARD, &params.construction_standard)?,
        complexity: lookup(TABLE_COMPLEXITY, &params.complexity)?,
    })
}

/// 总工期 = max(标准总工期, 启用学科中最大的自定义工期)
fn resolve_total_duration(
    active: &BTreeSet<DisciplineCode>,
    configuration: &BudgetConfiguration,
    tables: &PricingTables,
) -> u32 {
    active
        .iter()
        .filter_map(|code| configuration.config_for(*code))
        .filter_map(|c| c.custom_deadline)
        .fold(tables.project_duration_days, u32::max)
}

fn compose_indirect_costs(subtotal: f64, tables: &PricingTables) -> BudgetBreakdown {
    let rates = &tables.indirect;
    let pct = |p: f64| p / 100.0;

    let overhead = subtotal * pct(rates.overhead_pct);
    let contingency = subtotal * pct(rates.contingency_pct);
    let mut running = subtotal + overhead + contingency;

    let commission = running * pct(rates.commission_pct);
    running += commission;

    let margin = running * pct(rates.margin_pct);
    running += margin;

    let taxes = running * pct(rates.taxes_pct);

    BudgetBreakdown {
        subtotal,
        overhead,
        contingency,
        commission,
        margin,
        taxes,
    }
}

fn breakdown_total(b: &BudgetBreakdown) -> f64 {
    b.subtotal + b.overhead + b.contingency + b.commission + b.margin + b.taxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::pricing_tables::IndirectCostRates;
    use crate::domain::types::PhaseCode;

    fn params(area: f64, disciplines: &[&str]) -> ProjectParameters {
        ProjectParameters {
            built_area: area,
            region: "default".to_string(),
            construction_standard: "medium".to_string(),
            complexity: "medium".to_string(),
            active_disciplines: disciplines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_reference_scenario_is_pinned() {
        let calc = BudgetCalculator::new();
        let config = BudgetConfiguration::default_for("office-1");
        let tables = PricingTables::default();

        let result = calc
            .calculate(&params(150.0, &["ARQUITETURA"]), &config, &tables)
            .unwrap();

        assert!((result.discipline_values[&DisciplineCode::Arquitetura] - 18_000.0).abs() < 1e-9);
        assert!((result.breakdown.subtotal - 18_000.0).abs() < 1e-9);
        assert!((result.breakdown.overhead - 1_800.0).abs() < 1e-9);
        assert!((result.breakdown.contingency - 900.0).abs() < 1e-9);
        assert!((result.breakdown.margin - 3_105.0).abs() < 1e-9);
        assert!((result.breakdown.taxes - 1_904.4).abs() < 1e-9);
        assert!((result.total_value - 25_709.4).abs() < 1e-6);
        assert!((result.value_per_square_meter - 171.396).abs() < 1e-6);
    }

    #[test]
    fn test_commission_applies_before_margin() {
        let calc = BudgetCalculator::new();
        let config = BudgetConfiguration::default_for("office-1");
        let mut tables = PricingTables::default();
        tables.indirect = IndirectCostRates {
            overhead_pct: 0.0,
            contingency_pct: 0.0,
            commission_pct: 10.0,
            margin_pct: 10.0,
            taxes_pct: 0.0,
        };

        let result = calc
            .calculate(&params(100.0, &["ARQUITETURA"]), &config, &tables)
            .unwrap();
        // 12000 → +1200 佣金 → 13200 → +1320 利润
        assert!((result.breakdown.commission - 1_200.0).abs() < 1e-9);
        assert!((result.breakdown.margin - 1_320.0).abs() < 1e-9);
        assert!((result.total_value - 14_520.0).abs() < 1e-9);
    }

    #[test]
    fn test_pricing_modes() {
        let calc = BudgetCalculator::new();
        let m = Multipliers {
            regional: 1.0,
            standard: 1.0,
            complexity: 1.0,
        };

        // 固定金额
        let flat = calc.discipline_value(DisciplineCode::Topografia, None, 500.0, m);
        assert_eq!(flat, 2_500.0);

        // 按小时: 180/h × (0.3 h/m² × 100 m²)
        let hourly = calc.discipline_value(DisciplineCode::Interiores, None, 100.0, m);
        assert!((hourly - 5_400.0).abs() < 1e-9);

        // 覆写: 按小时 + 自定义工时
        let cfg = DisciplineConfig {
            pricing_mode: Some(PricingMode::PerHour),
            custom_value: Some(200.0),
            custom_hours: Some(40.0),
            ..DisciplineConfig::default()
        };
        let custom = calc.discipline_value(DisciplineCode::Estrutural, Some(&cfg), 100.0, m);
        assert!((custom - 8_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_discipline_complexity_override_replaces_table_value() {
        let calc = BudgetCalculator::new();
        let m = Multipliers {
            regional: 1.1,
            standard: 1.0,
            complexity: 1.2,
        };
        let cfg = DisciplineConfig {
            complexity_multiplier: Some(1.5),
            ..DisciplineConfig::default()
        };
        let value = calc.discipline_value(DisciplineCode::Arquitetura, Some(&cfg), 10.0, m);
        assert!((value - 120.0 * 10.0 * 1.1 * 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_determinism() {
        let calc = BudgetCalculator::new();
        let config = BudgetConfiguration::default_for("office-1");
        let tables = PricingTables::default();
        let p = params(
            237.5,
            &["ARQUITETURA", "ESTRUTURAL", "FUNDACOES", "INSTALACOES_ELETRICAS", "LUMINOTECNICO"],
        );

        let a = calc.calculate(&p, &config, &tables).unwrap();
        let b = calc.calculate(&p, &config, &tables).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.total_value.to_bits(), b.total_value.to_bits());
    }

    #[test]
    fn test_monotonic_deactivation() {
        let calc = BudgetCalculator::new();
        let config = BudgetConfiguration::default_for("office-1");
        let tables = PricingTables::default();

        let with = calc
            .calculate(&params(200.0, &["ARQUITETURA", "ESTRUTURAL"]), &config, &tables)
            .unwrap();
        let without = calc
            .calculate(&params(200.0, &["ARQUITETURA"]), &config, &tables)
            .unwrap();

        assert!(without.total_value <= with.total_value);

        let removed: Vec<PhaseCode> = with
            .schedule
            .iter()
            .zip(without.schedule.iter())
            .filter(|(a, b)| a.active && !b.active)
            .map(|(a, _)| a.stage_code)
            .collect();
        assert_eq!(removed, vec![PhaseCode::PB]);
    }

    #[test]
    fn test_custom_deadline_extends_duration() {
        let calc = BudgetCalculator::new();
        let mut config = BudgetConfiguration::default_for("office-1");
        config.configs_by_discipline.insert(
            DisciplineCode::Arquitetura,
            DisciplineConfig {
                custom_deadline: Some(180),
                ..DisciplineConfig::default()
            },
        );
        let tables = PricingTables::default();

        let result = calc
            .calculate(&params(100.0, &["ARQUITETURA"]), &config, &tables)
            .unwrap();
        assert_eq!(result.total_duration_days, 180);
        let days: u32 = result.schedule.iter().map(|p| p.duration_days).sum();
        assert_eq!(days, 180);
    }

    #[test]
    fn test_invalid_area_rejected() {
        let calc = BudgetCalculator::new();
        let config = BudgetConfiguration::default_for("office-1");
        let tables = PricingTables::default();

        for area in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let err = calc
                .calculate(&params(area, &["ARQUITETURA"]), &config, &tables)
                .unwrap_err();
            assert!(matches!(err, CalculationError::InvalidParameter { .. }));
        }
    }

    #[test]
    fn test_configuration_errors() {
        let calc = BudgetCalculator::new();
        let config = BudgetConfiguration::default_for("office-1");
        let tables = PricingTables::default();

        let empty = calc.calculate(&params(100.0, &[]), &config, &tables).unwrap_err();
        assert!(matches!(empty, CalculationError::InvalidConfiguration { .. }));

        let missing = calc
            .calculate(&params(100.0, &["ESTRUTURAL"]), &config, &tables)
            .unwrap_err();
        assert!(matches!(missing, CalculationError::InvalidConfiguration { .. }));

        let unknown = calc
            .calculate(&params(100.0, &["ARQUITETURA", "ACUSTICA"]), &config, &tables)
            .unwrap_err();
        match unknown {
            CalculationError::InvalidConfiguration { violations, .. } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].discipline.as_deref(), Some("ACUSTICA"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_lookup_error_names_key() {
        let calc = BudgetCalculator::new();
        let config = BudgetConfiguration::default_for("office-1");
        let tables = PricingTables::default();
        let mut p = params(100.0, &["ARQUITETURA"]);
        p.construction_standard = "premium".to_string();

        let err = calc.calculate(&p, &config, &tables).unwrap_err();
        assert_eq!(
            err,
            CalculationError::Lookup {
                table: "constructionStandard".to_string(),
                key: "premium".to_string(),
            }
        );
    }
}
