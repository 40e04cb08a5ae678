// ==========================================
// ArcFlow - 学科目录层（静态参考数据）
// ==========================================
// 职责: 学科目录、标准阶段、阶段交付物
// 红线: 只读; 不含配置、不含计算
// ==========================================

pub mod disciplines;
pub mod phases;

pub use phases::{canonical_phases, deliverables_for, CanonicalPhase};
