// ==========================================
// ArcFlow 预算引擎 - 阶段进度推导
// ==========================================
// 规则:
// 1) 阶段启用 ⇔ 阶段所需学科 ∩ 启用学科 ≠ ∅
// 2) 仅启用阶段分配工期与金额, 按基础权重重新归一
// 3) 工期按最大余数法分配整数天, 合计严格等于总工期
// 4) 金额按占比分配, 末个启用阶段吸收舍入误差, 合计等于总价
// 5) 交付物 = 各启用学科在该阶段交付物的有序去重并集
// ==========================================

use crate::catalog::{canonical_phases, deliverables_for, CanonicalPhase};
use crate::domain::budget::SchedulePhase;
use crate::domain::types::DisciplineCode;
use std::collections::BTreeSet;

/// 构建阶段进度
pub fn build_schedule(
    active: &BTreeSet<DisciplineCode>,
    total_value: f64,
    total_days: u32,
) -> Vec<SchedulePhase> {
    let phases = canonical_phases();
    let flags: Vec<bool> = phases.iter().map(|p| is_phase_active(p, active)).collect();

    let days = distribute_days(phases, &flags, total_days);

    let value_weight: f64 = phases
        .iter()
        .zip(flags.iter())
        .filter(|(_, on)| **on)
        .map(|(p, _)| p.value_percent)
        .sum();
    let last_active = flags.iter().rposition(|on| *on);

    let mut allocated = 0.0;
    let mut schedule = Vec::with_capacity(phases.len());

    for (idx, phase) in phases.iter().enumerate() {
        let on = flags[idx];

        let (value, percent) = if !on || value_weight <= 0.0 {
            (0.0, 0.0)
        } else if Some(idx) == last_active {
            (total_value - allocated, phase.value_percent / value_weight * 100.0)
        } else {
            let share = phase.value_percent / value_weight;
            (total_value * share, share * 100.0)
        };
        allocated += value;

        schedule.push(SchedulePhase {
            order: phase.order,
            stage_code: phase.code,
            name: phase.name.to_string(),
            duration_days: days[idx],
            value,
            percent_of_total: percent,
            disciplines: phase.disciplines.to_vec(),
            deliverables: if on {
                collect_deliverables(phase, active)
            } else {
                Vec::new()
            },
            active: on,
        });
    }

    schedule
}

fn is_phase_active(phase: &CanonicalPhase, active: &BTreeSet<DisciplineCode>) -> bool {
    phase.disciplines.iter().any(|code| active.contains(code))
}

/// 最大余数法分配整数工期
fn distribute_days(phases: &[CanonicalPhase], flags: &[bool], total_days: u32) -> Vec<u32> {
    let total_weight: u64 = phases
        .iter()
        .zip(flags.iter())
        .filter(|(_, on)| **on)
        .map(|(p, _)| p.duration_weight as u64)
        .sum();

    let mut days = vec![0u32; phases.len()];
    if total_weight == 0 {
        return days;
    }

    let mut remainders: Vec<(usize, u64)> = Vec::new();
    let mut assigned: u64 = 0;

    for (idx, phase) in phases.iter().enumerate() {
        if !flags[idx] {
            continue;
        }
        let numerator = total_days as u64 * phase.duration_weight as u64;
        let floor = numerator / total_weight;
        days[idx] = floor as u32;
        assigned += floor;
        remainders.push((idx, numerator % total_weight));
    }

    // 余数大者优先, 同余数按阶段顺序
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let leftover = (total_days as u64).saturating_sub(assigned) as usize;
    for (idx, _) in remainders.iter().take(leftover) {
        days[*idx] += 1;
    }

    days
}

fn collect_deliverables(phase: &CanonicalPhase, active: &BTreeSet<DisciplineCode>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for code in phase.disciplines.iter().filter(|c| active.contains(*c)) {
        for item in deliverables_for(*code, phase.code) {
            if !out.iter().any(|existing| existing == item) {
                out.push(item.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::PhaseCode;
    use DisciplineCode::*;

    fn set(codes: &[DisciplineCode]) -> BTreeSet<DisciplineCode> {
        codes.iter().copied().collect()
    }

    #[test]
    fn test_essential_only_skips_basic_design() {
        let schedule = build_schedule(&set(&[Arquitetura]), 10_000.0, 120);
        let pb = schedule.iter().find(|p| p.stage_code == PhaseCode::PB).unwrap();
        assert!(!pb.active);
        assert_eq!(pb.duration_days, 0);
        assert_eq!(pb.value, 0.0);
        assert!(pb.deliverables.is_empty());
        assert_eq!(schedule.iter().filter(|p| p.active).count(), 7);
    }

    #[test]
    fn test_conservation_of_days_and_value() {
        for active in [
            set(&[Arquitetura]),
            set(&[Arquitetura, Estrutural]),
            set(&[Arquitetura, Estrutural, Fundacoes, InstalacoesEletricas, Climatizacao]),
        ] {
            for total_days in [1u32, 7, 97, 120, 365] {
                let schedule = build_schedule(&active, 25_709.4, total_days);
                let days: u32 = schedule.iter().map(|p| p.duration_days).sum();
                let value: f64 = schedule.iter().map(|p| p.value).sum();
                let pct: f64 = schedule.iter().map(|p| p.percent_of_total).sum();
                assert_eq!(days, total_days);
                assert!((value - 25_709.4).abs() < 1e-6);
                assert!((pct - 100.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_deliverables_union_is_ordered_and_deduplicated() {
        let schedule = build_schedule(&set(&[Arquitetura, Estrutural]), 1_000.0, 100);
        let pe = schedule.iter().find(|p| p.stage_code == PhaseCode::PE).unwrap();
        assert_eq!(
            pe.deliverables,
            vec![
                "Plantas executivas",
                "Detalhamentos",
                "Caderno de especificações",
                "Formas e armaduras",
                "Memorial de cálculo estrutural",
            ]
        );

        let ap = schedule.iter().find(|p| p.stage_code == PhaseCode::AP).unwrap();
        let planta_count = ap.deliverables.iter().filter(|d| *d == "Plantas baixas").count();
        assert_eq!(planta_count, 1);
    }

    #[test]
    fn test_days_distribution_full_set() {
        // 全部阶段启用时, 工期权重合计 100, 总工期 100 天即权重本身
        let schedule = build_schedule(&set(&[Arquitetura, Estrutural]), 0.0, 100);
        let days: Vec<u32> = schedule.iter().map(|p| p.duration_days).collect();
        assert_eq!(days, vec![5, 5, 10, 15, 15, 15, 10, 25]);
    }
}
