// ==========================================
// ArcFlow 预算引擎 - 领域类型定义
// ==========================================
// 职责: 学科代码、学科分类、计价模式、阶段代码、调度状态
// 红线: 学科代码是封闭枚举,未知代码必须在边界处被拒绝
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 学科代码 (Discipline Code)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库/前端一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisciplineCode {
    Arquitetura,            // 建筑设计 (必选)
    Topografia,             // 地形测绘
    Estrutural,             // 结构
    Fundacoes,              // 基础
    InstalacoesEletricas,   // 电气
    InstalacoesHidraulicas, // 给排水
    Climatizacao,           // 暖通空调
    PrevencaoIncendio,      // 消防
    Luminotecnico,          // 照明设计
    Paisagismo,             // 景观
    Interiores,             // 室内设计
    Compatibilizacao,       // 专业间碰撞协调
    CoordenacaoBim,         // BIM 协调
}

impl DisciplineCode {
    /// 全部学科代码（目录顺序）
    pub const ALL: [DisciplineCode; 13] = [
        DisciplineCode::Arquitetura,
        DisciplineCode::Topografia,
        DisciplineCode::Estrutural,
        DisciplineCode::Fundacoes,
        DisciplineCode::InstalacoesEletricas,
        DisciplineCode::InstalacoesHidraulicas,
        DisciplineCode::Climatizacao,
        DisciplineCode::PrevencaoIncendio,
        DisciplineCode::Luminotecnico,
        DisciplineCode::Paisagismo,
        DisciplineCode::Interiores,
        DisciplineCode::Compatibilizacao,
        DisciplineCode::CoordenacaoBim,
    ];

    /// 必选学科
    pub const ESSENTIAL: DisciplineCode = DisciplineCode::Arquitetura;

    /// 转换为字符串 (用于数据库存储与结果输出)
    pub fn as_str(&self) -> &'static str {
        match self {
            DisciplineCode::Arquitetura => "ARQUITETURA",
            DisciplineCode::Topografia => "TOPOGRAFIA",
            DisciplineCode::Estrutural => "ESTRUTURAL",
            DisciplineCode::Fundacoes => "FUNDACOES",
            DisciplineCode::InstalacoesEletricas => "INSTALACOES_ELETRICAS",
            DisciplineCode::InstalacoesHidraulicas => "INSTALACOES_HIDRAULICAS",
            DisciplineCode::Climatizacao => "CLIMATIZACAO",
            DisciplineCode::PrevencaoIncendio => "PREVENCAO_INCENDIO",
            DisciplineCode::Luminotecnico => "LUMINOTECNICO",
            DisciplineCode::Paisagismo => "PAISAGISMO",
            DisciplineCode::Interiores => "INTERIORES",
            DisciplineCode::Compatibilizacao => "COMPATIBILIZACAO",
            DisciplineCode::CoordenacaoBim => "COORDENACAO_BIM",
        }
    }

    /// 从字符串解析（大小写、首尾空白不敏感）
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase();
        DisciplineCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == normalized)
    }
}

impl fmt::Display for DisciplineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 学科分类 (Discipline Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisciplineCategory {
    Essential,     // 必选
    Complementary, // 补充专业
    Specialized,   // 专项
}

impl fmt::Display for DisciplineCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisciplineCategory::Essential => write!(f, "ESSENTIAL"),
            DisciplineCategory::Complementary => write!(f, "COMPLEMENTARY"),
            DisciplineCategory::Specialized => write!(f, "SPECIALIZED"),
        }
    }
}

// ==========================================
// 计价模式 (Pricing Mode)
// ==========================================
// FLAT: 固定金额
// PER_SQUARE_METER: 单价 × 建筑面积
// PER_HOUR: 小时费率 × 预估工时
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingMode {
    Flat,
    PerSquareMeter,
    PerHour,
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMode::Flat => write!(f, "FLAT"),
            PricingMode::PerSquareMeter => write!(f, "PER_SQUARE_METER"),
            PricingMode::PerHour => write!(f, "PER_HOUR"),
        }
    }
}

// ==========================================
// 阶段代码 (Phase Code)
// ==========================================
// 顺序即交付顺序: 调研 → 任务书 → 可行性 → 初步研究 → 方案 → 报建 → 基础设计 → 施工图
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhaseCode {
    LV, // Levantamento (现场调研)
    PN, // Programa de Necessidades (任务书)
    EV, // Estudo de Viabilidade (可行性)
    EP, // Estudo Preliminar (初步研究)
    AP, // Anteprojeto (方案设计)
    PL, // Projeto Legal (报建)
    PB, // Projeto Básico (基础设计)
    PE, // Projeto Executivo (施工图)
}

impl fmt::Display for PhaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ==========================================
// 保留任务触发方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunTrigger {
    Scheduled, // 定时触发
    Manual,    // 人工触发
}

impl fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTrigger::Scheduled => write!(f, "SCHEDULED"),
            RunTrigger::Manual => write!(f, "MANUAL"),
        }
    }
}

// ==========================================
// 保留任务结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetentionOutcome {
    Success,
    PartialFailure,
}

impl fmt::Display for RetentionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionOutcome::Success => write!(f, "SUCCESS"),
            RetentionOutcome::PartialFailure => write!(f, "PARTIAL_FAILURE"),
        }
    }
}

// ==========================================
// 调度器状态
// ==========================================
// IDLE → SCHEDULED → RUNNING → SCHEDULED (循环) 或 STOPPED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulerState {
    Idle,
    Scheduled,
    Running,
    Stopped,
}

impl SchedulerState {
    /// 是否存在有效的定时计划
    pub fn is_active(&self) -> bool {
        matches!(self, SchedulerState::Scheduled | SchedulerState::Running)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Idle => write!(f, "IDLE"),
            SchedulerState::Scheduled => write!(f, "SCHEDULED"),
            SchedulerState::Running => write!(f, "RUNNING"),
            SchedulerState::Stopped => write!(f, "STOPPED"),
        }
    }
}
