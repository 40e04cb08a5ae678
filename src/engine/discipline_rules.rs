// ==========================================
// ArcFlow 预算引擎 - 学科规则校验
// ==========================================
// 规则（全部检查,汇总输出）:
// 1) 启用集合必须包含必选学科 ARQUITETURA
// 2) 启用学科的依赖必须全部启用
// 3) 互斥学科不可同时启用
// 4) 覆写数值必须合法（非负/正数/有限）
// ==========================================
// 红线: 校验只判定,不修正; 所有违规必须输出原因
// ==========================================

use crate::catalog::disciplines;
use crate::domain::discipline::DisciplineConfig;
use crate::domain::types::DisciplineCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// RuleViolationKind - 违规类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleViolationKind {
    EssentialMissing,
    UnknownDiscipline,
    DependencyMissing,
    Incompatible,
    InvalidOverride,
}

impl RuleViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleViolationKind::EssentialMissing => "ESSENTIAL_MISSING",
            RuleViolationKind::UnknownDiscipline => "UNKNOWN_DISCIPLINE",
            RuleViolationKind::DependencyMissing => "DEPENDENCY_MISSING",
            RuleViolationKind::Incompatible => "INCOMPATIBLE",
            RuleViolationKind::InvalidOverride => "INVALID_OVERRIDE",
        }
    }
}

// ==========================================
// RuleViolation - 违规明细（字段级）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub kind: RuleViolationKind,
    /// 违规字段（如 activeDisciplines / configsByDiscipline.ESTRUTURAL.customValue）
    pub field: String,
    /// 相关学科代码
    pub discipline: Option<String>,
    pub reason: String,
}

impl RuleViolation {
    fn new(kind: RuleViolationKind, field: String, discipline: Option<String>, reason: String) -> Self {
        Self {
            kind,
            field,
            discipline,
            reason,
        }
    }
}

// ==========================================
// 启用集合校验
// ==========================================

/// 校验启用学科集合（必选、依赖、互斥）
pub fn validate_active_set(active: &BTreeSet<DisciplineCode>) -> Vec<RuleViolation> {
    let mut violations = Vec::new();

    // 规则1: 必选学科
    if !active.contains(&DisciplineCode::ESSENTIAL) {
        violations.push(RuleViolation::new(
            RuleViolationKind::EssentialMissing,
            "activeDisciplines".to_string(),
            Some(DisciplineCode::ESSENTIAL.as_str().to_string()),
            format!("必选学科 {} 不可停用", DisciplineCode::ESSENTIAL),
        ));
    }

    for code in active {
        let discipline = disciplines::get(*code);

        // 规则2: 依赖
        for dep in discipline.dependencies {
            if !active.contains(dep) {
                violations.push(RuleViolation::new(
                    RuleViolationKind::DependencyMissing,
                    "activeDisciplines".to_string(),
                    Some(code.as_str().to_string()),
                    format!("学科 {} 依赖 {}, 但 {} 未启用", code, dep, dep),
                ));
            }
        }

        // 规则3: 互斥（每对只报告一次）
        for other in discipline.incompatibilities {
            if active.contains(other) && code < other {
                violations.push(RuleViolation::new(
                    RuleViolationKind::Incompatible,
                    "activeDisciplines".to_string(),
                    Some(code.as_str().to_string()),
                    format!("学科 {} 与 {} 互斥, 不可同时启用", code, other),
                ));
            }
        }
    }

    violations
}

// ==========================================
// 覆写值校验
// ==========================================

/// 校验学科覆写值
pub fn validate_overrides(configs: &BTreeMap<DisciplineCode, DisciplineConfig>) -> Vec<RuleViolation> {
    let mut violations = Vec::new();

    for (code, cfg) in configs {
        let field = |name: &str| format!("configsByDiscipline.{}.{}", code, name);

        if let Some(v) = cfg.custom_value {
            if !v.is_finite() || v < 0.0 {
                violations.push(RuleViolation::new(
                    RuleViolationKind::InvalidOverride,
                    field("customValue"),
                    Some(code.as_str().to_string()),
                    format!("自定义金额必须为非负有限数, 实际={}", v),
                ));
            }
        }

        if let Some(m) = cfg.complexity_multiplier {
            if !m.is_finite() || m <= 0.0 {
                violations.push(RuleViolation::new(
                    RuleViolationKind::InvalidOverride,
                    field("complexityMultiplier"),
                    Some(code.as_str().to_string()),
                    format!("复杂度系数必须为正数, 实际={}", m),
                ));
            }
        }

        if let Some(days) = cfg.custom_deadline {
            if days == 0 {
                violations.push(RuleViolation::new(
                    RuleViolationKind::InvalidOverride,
                    field("customDeadline"),
                    Some(code.as_str().to_string()),
                    "自定义工期必须大于0天".to_string(),
                ));
            }
        }

        if let Some(h) = cfg.custom_hours {
            if !h.is_finite() || h < 0.0 {
                violations.push(RuleViolation::new(
                    RuleViolationKind::InvalidOverride,
                    field("customHours"),
                    Some(code.as_str().to_string()),
                    format!("自定义工时必须为非负有限数, 实际={}", h),
                ));
            }
        }

        if *code == DisciplineCode::ESSENTIAL && !cfg.active {
            violations.push(RuleViolation::new(
                RuleViolationKind::EssentialMissing,
                field("active"),
                Some(code.as_str().to_string()),
                format!("必选学科 {} 不可停用", code),
            ));
        }
    }

    violations
}

// ==========================================
// 原始代码解析
// ==========================================

/// 解析原始学科代码列表; 未知代码输出违规
pub fn parse_codes(raw: &[String], field: &str) -> (BTreeSet<DisciplineCode>, Vec<RuleViolation>) {
    let mut codes = BTreeSet::new();
    let mut violations = Vec::new();

    for (idx, s) in raw.iter().enumerate() {
        match DisciplineCode::parse(s) {
            Some(code) => {
                codes.insert(code);
            }
            None => violations.push(RuleViolation::new(
                RuleViolationKind::UnknownDiscipline,
                format!("{}[{}]", field, idx),
                Some(s.clone()),
                format!("未知学科代码: {}", s),
            )),
        }
    }

    (codes, violations)
}

/// 解析覆写表的学科键; 未知键输出违规
pub fn parse_config_keys(
    raw: &BTreeMap<String, DisciplineConfig>,
    field: &str,
) -> (BTreeMap<DisciplineCode, DisciplineConfig>, Vec<RuleViolation>) {
    let mut configs = BTreeMap::new();
    let mut violations = Vec::new();

    for (key, cfg) in raw {
        match DisciplineCode::parse(key) {
            Some(code) => {
                configs.insert(code, cfg.clone());
            }
            None => violations.push(RuleViolation::new(
                RuleViolationKind::UnknownDiscipline,
                format!("{}.{}", field, key),
                Some(key.clone()),
                format!("未知学科代码: {}", key),
            )),
        }
    }

    (configs, violations)
}

/// 完整配置校验 (启用集合 + 覆写值)
pub fn validate_configuration(
    active: &BTreeSet<DisciplineCode>,
    configs: &BTreeMap<DisciplineCode, DisciplineConfig>,
) -> Vec<RuleViolation> {
    let mut violations = validate_active_set(active);
    violations.extend(validate_overrides(configs));
    violations
}
