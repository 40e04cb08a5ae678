// ==========================================
// ArcFlow 预算引擎 - 标准阶段与交付物表
// ==========================================
// 阶段顺序固定; 阶段是否启用取决于其所需学科与启用学科是否有交集
// ==========================================

use crate::domain::types::{DisciplineCode, PhaseCode};
use serde::Serialize;

use DisciplineCode::*;

// ==========================================
// CanonicalPhase - 标准阶段定义
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPhase {
    pub order: u32,
    pub code: PhaseCode,
    pub name: &'static str,
    /// 阶段价值占比（%）,全部阶段合计 100
    pub value_percent: f64,
    /// 阶段工期权重,全部阶段合计 100
    pub duration_weight: u32,
    pub disciplines: &'static [DisciplineCode],
}

static PHASES: [CanonicalPhase; 8] = [
    CanonicalPhase {
        order: 1,
        code: PhaseCode::LV,
        name: "Levantamento de Dados",
        value_percent: 5.0,
        duration_weight: 5,
        disciplines: &[Arquitetura, Topografia],
    },
    CanonicalPhase {
        order: 2,
        code: PhaseCode::PN,
        name: "Programa de Necessidades",
        value_percent: 5.0,
        duration_weight: 5,
        disciplines: &[Arquitetura],
    },
    CanonicalPhase {
        order: 3,
        code: PhaseCode::EV,
        name: "Estudo de Viabilidade",
        value_percent: 10.0,
        duration_weight: 10,
        disciplines: &[Arquitetura],
    },
    CanonicalPhase {
        order: 4,
        code: PhaseCode::EP,
        name: "Estudo Preliminar",
        value_percent: 15.0,
        duration_weight: 15,
        disciplines: &[Arquitetura, Paisagismo, Interiores],
    },
    CanonicalPhase {
        order: 5,
        code: PhaseCode::AP,
        name: "Anteprojeto",
        value_percent: 15.0,
        duration_weight: 15,
        disciplines: &[
            Arquitetura,
            Estrutural,
            InstalacoesEletricas,
            InstalacoesHidraulicas,
            Luminotecnico,
            Paisagismo,
            Interiores,
        ],
    },
    CanonicalPhase {
        order: 6,
        code: PhaseCode::PL,
        name: "Projeto Legal",
        value_percent: 10.0,
        duration_weight: 15,
        disciplines: &[Arquitetura, PrevencaoIncendio],
    },
    CanonicalPhase {
        order: 7,
        code: PhaseCode::PB,
        name: "Projeto Básico",
        value_percent: 15.0,
        duration_weight: 10,
        disciplines: &[
            Estrutural,
            Fundacoes,
            InstalacoesEletricas,
            InstalacoesHidraulicas,
            Climatizacao,
            PrevencaoIncendio,
            Compatibilizacao,
            CoordenacaoBim,
        ],
    },
    CanonicalPhase {
        order: 8,
        code: PhaseCode::PE,
        name: "Projeto Executivo",
        value_percent: 25.0,
        duration_weight: 25,
        disciplines: &[
            Arquitetura,
            Estrutural,
            Fundacoes,
            InstalacoesEletricas,
            InstalacoesHidraulicas,
            Climatizacao,
            PrevencaoIncendio,
            Luminotecnico,
            Paisagismo,
            Interiores,
            Compatibilizacao,
            CoordenacaoBim,
        ],
    },
];

/// 全部标准阶段（交付顺序）
pub fn canonical_phases() -> &'static [CanonicalPhase] {
    &PHASES
}

/// 学科在某阶段的交付物
pub fn deliverables_for(discipline: DisciplineCode, phase: PhaseCode) -> &'static [&'static str] {
    match (discipline, phase) {
        // ===== 建筑 =====
        (Arquitetura, PhaseCode::LV) => &["Levantamento fotográfico", "Levantamento cadastral"],
        (Arquitetura, PhaseCode::PN) => &["Programa de necessidades", "Fluxograma funcional"],
        (Arquitetura, PhaseCode::EV) => &["Estudo de massa", "Análise de legislação urbanística"],
        (Arquitetura, PhaseCode::EP) => &["Planta de implantação", "Plantas baixas", "Volumetria"],
        (Arquitetura, PhaseCode::AP) => &["Plantas baixas", "Cortes", "Fachadas", "Memorial descritivo"],
        (Arquitetura, PhaseCode::PL) => &["Projeto para aprovação na prefeitura", "Quadro de áreas"],
        (Arquitetura, PhaseCode::PE) => &["Plantas executivas", "Detalhamentos", "Caderno de especificações"],

        // ===== 测绘 =====
        (Topografia, PhaseCode::LV) => &["Levantamento planialtimétrico"],

        // ===== 结构/基础 =====
        (Estrutural, PhaseCode::AP) => &["Lançamento estrutural"],
        (Estrutural, PhaseCode::PB) => &["Pré-dimensionamento estrutural"],
        (Estrutural, PhaseCode::PE) => &["Formas e armaduras", "Memorial de cálculo estrutural"],
        (Fundacoes, PhaseCode::PB) => &["Estudo de fundações"],
        (Fundacoes, PhaseCode::PE) => &["Projeto executivo de fundações"],

        // ===== 机电 =====
        (InstalacoesEletricas, PhaseCode::AP) => &["Pontos elétricos preliminares"],
        (InstalacoesEletricas, PhaseCode::PB) => &["Diagrama unifilar", "Quadro de cargas"],
        (InstalacoesEletricas, PhaseCode::PE) => &["Projeto elétrico executivo"],
        (InstalacoesHidraulicas, PhaseCode::AP) => &["Pontos hidráulicos preliminares"],
        (InstalacoesHidraulicas, PhaseCode::PB) => &["Traçado hidrossanitário"],
        (InstalacoesHidraulicas, PhaseCode::PE) => &["Projeto hidrossanitário executivo"],
        (Climatizacao, PhaseCode::PB) => &["Cálculo de carga térmica"],
        (Climatizacao, PhaseCode::PE) => &["Projeto de climatização executivo"],
        (PrevencaoIncendio, PhaseCode::PL) => &["Projeto para aprovação no Corpo de Bombeiros"],
        (PrevencaoIncendio, PhaseCode::PB) => &["Rotas de fuga e compartimentação"],
        (PrevencaoIncendio, PhaseCode::PE) => &["Projeto de combate a incêndio executivo"],

        // ===== 专项 =====
        (Luminotecnico, PhaseCode::AP) => &["Conceito luminotécnico"],
        (Luminotecnico, PhaseCode::PE) => &["Projeto luminotécnico executivo"],
        (Paisagismo, PhaseCode::EP) => &["Estudo paisagístico"],
        (Paisagismo, PhaseCode::AP) => &["Planta de paisagismo"],
        (Paisagismo, PhaseCode::PE) => &["Detalhamento paisagístico", "Especificação de espécies"],
        (Interiores, PhaseCode::EP) => &["Moodboard", "Layout de interiores"],
        (Interiores, PhaseCode::AP) => &["Perspectivas de interiores"],
        (Interiores, PhaseCode::PE) => &["Detalhamento de marcenaria", "Paginação de pisos"],
        (Compatibilizacao, PhaseCode::PB) => &["Relatório de interferências"],
        (Compatibilizacao, PhaseCode::PE) => &["Relatório final de compatibilização"],
        (CoordenacaoBim, PhaseCode::PB) => &["Plano de execução BIM", "Modelo federado"],
        (CoordenacaoBim, PhaseCode::PE) => &["Relatório de clash detection", "Modelo federado final"],

        _ => &[],
    }
}
