// ==========================================
// ArcFlow - 学科目录 API
// ==========================================
// 职责: 只读查询学科目录、标准阶段及交付物 (供配置界面展示)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::catalog::{self, disciplines, CanonicalPhase};
use crate::domain::discipline::Discipline;
use crate::domain::types::PhaseCode;
use serde::Serialize;

/// 单个阶段下某学科的交付物
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDeliverables {
    pub stage_code: PhaseCode,
    pub deliverables: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CatalogApi {}

impl CatalogApi {
    pub fn new() -> Self {
        Self {}
    }

    /// 全部学科（目录顺序）
    pub fn list_disciplines(&self) -> Vec<Discipline> {
        disciplines::all().to_vec()
    }

    /// 按代码查询学科（大小写不敏感）
    pub fn get_discipline(&self, code: &str) -> ApiResult<Discipline> {
        disciplines::find(code)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("学科(code={})不存在", code.trim())))
    }

    /// 标准阶段（固定顺序）
    pub fn list_phases(&self) -> Vec<CanonicalPhase> {
        catalog::canonical_phases().to_vec()
    }

    /// 某学科在各阶段的交付物（仅列出该学科参与的阶段）
    pub fn deliverables_of(&self, code: &str) -> ApiResult<Vec<PhaseDeliverables>> {
        let discipline = self.get_discipline(code)?;

        Ok(catalog::canonical_phases()
            .iter()
            .filter(|phase| phase.disciplines.contains(&discipline.code))
            .map(|phase| PhaseDeliverables {
                stage_code: phase.code,
                deliverables: catalog::deliverables_for(discipline.code, phase.code)
                    .iter()
                    .map(|d| d.to_string())
                    .collect(),
            })
            .collect())
    }
}
