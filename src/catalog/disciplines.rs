// ==========================================
// ArcFlow 预算引擎 - 学科目录（静态参考数据）
// ==========================================
// 红线: 目录在运行期不可变; ARQUITETURA 是唯一必选学科
// ==========================================

use crate::domain::discipline::Discipline;
use crate::domain::types::{DisciplineCategory, DisciplineCode, PricingMode};

use DisciplineCode::*;

static CATALOG: [Discipline; 13] = [
    Discipline {
        code: Arquitetura,
        name: "Arquitetura",
        category: DisciplineCategory::Essential,
        dependencies: &[],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::PerSquareMeter,
        base_value: 120.0,
        base_hours: 0.8,
    },
    Discipline {
        code: Topografia,
        name: "Levantamento Topográfico",
        category: DisciplineCategory::Complementary,
        dependencies: &[],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::Flat,
        base_value: 2500.0,
        base_hours: 0.05,
    },
    Discipline {
        code: Estrutural,
        name: "Projeto Estrutural",
        category: DisciplineCategory::Complementary,
        dependencies: &[],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::PerSquareMeter,
        base_value: 35.0,
        base_hours: 0.25,
    },
    Discipline {
        code: Fundacoes,
        name: "Projeto de Fundações",
        category: DisciplineCategory::Complementary,
        dependencies: &[Estrutural],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::PerSquareMeter,
        base_value: 12.0,
        base_hours: 0.08,
    },
    Discipline {
        code: InstalacoesEletricas,
        name: "Instalações Elétricas",
        category: DisciplineCategory::Complementary,
        dependencies: &[],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::PerSquareMeter,
        base_value: 18.0,
        base_hours: 0.15,
    },
    Discipline {
        code: InstalacoesHidraulicas,
        name: "Instalações Hidrossanitárias",
        category: DisciplineCategory::Complementary,
        dependencies: &[],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::PerSquareMeter,
        base_value: 16.0,
        base_hours: 0.14,
    },
    Discipline {
        code: Climatizacao,
        name: "Climatização",
        category: DisciplineCategory::Specialized,
        dependencies: &[InstalacoesEletricas],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::PerSquareMeter,
        base_value: 22.0,
        base_hours: 0.12,
    },
    Discipline {
        code: PrevencaoIncendio,
        name: "Prevenção e Combate a Incêndio",
        category: DisciplineCategory::Specialized,
        dependencies: &[InstalacoesHidraulicas],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::Flat,
        base_value: 3500.0,
        base_hours: 0.06,
    },
    Discipline {
        code: Luminotecnico,
        name: "Luminotécnico",
        category: DisciplineCategory::Specialized,
        dependencies: &[InstalacoesEletricas],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::PerHour,
        base_value: 150.0,
        base_hours: 0.05,
    },
    Discipline {
        code: Paisagismo,
        name: "Paisagismo",
        category: DisciplineCategory::Specialized,
        dependencies: &[],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::PerSquareMeter,
        base_value: 15.0,
        base_hours: 0.1,
    },
    Discipline {
        code: Interiores,
        name: "Arquitetura de Interiores",
        category: DisciplineCategory::Specialized,
        dependencies: &[],
        incompatibilities: &[],
        default_pricing_mode: PricingMode::PerHour,
        base_value: 180.0,
        base_hours: 0.3,
    },
    Discipline {
        code: Compatibilizacao,
        name: "Compatibilização de Projetos",
        category: DisciplineCategory::Specialized,
        dependencies: &[Estrutural],
        incompatibilities: &[CoordenacaoBim],
        default_pricing_mode: PricingMode::PerSquareMeter,
        base_value: 8.0,
        base_hours: 0.05,
    },
    Discipline {
        code: CoordenacaoBim,
        name: "Coordenação BIM",
        category: DisciplineCategory::Specialized,
        dependencies: &[Estrutural],
        incompatibilities: &[Compatibilizacao],
        default_pricing_mode: PricingMode::PerSquareMeter,
        base_value: 14.0,
        base_hours: 0.1,
    },
];

/// 全部学科（目录顺序）
pub fn all() -> &'static [Discipline] {
    &CATALOG
}

/// 按代码查询学科
///
/// 目录覆盖全部 DisciplineCode,因此总能命中
pub fn get(code: DisciplineCode) -> &'static Discipline {
    // 目录顺序与 DisciplineCode::ALL 一致
    let idx = DisciplineCode::ALL
        .iter()
        .position(|c| *c == code)
        .unwrap_or(0);
    &CATALOG[idx]
}

/// 按字符串代码查询
pub fn find(code: &str) -> Option<&'static Discipline> {
    DisciplineCode::parse(code).map(get)
}
