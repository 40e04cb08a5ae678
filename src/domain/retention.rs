// ==========================================
// ArcFlow - 数据保留任务领域模型
// ==========================================
// RetentionRun: 一次保留任务执行的审计摘要
// 生命周期: 执行完成时创建,写入审计一次,之后不再修改
// ==========================================

use crate::domain::types::{RetentionOutcome, RunTrigger, SchedulerState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// RetentionRun - 执行摘要
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRun {
    pub run_id: String,
    pub trigger: RunTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    /// 类别 → 删除条数（失败类别计 0）
    pub items_removed: BTreeMap<String, usize>,
    /// 类别 → 失败原因
    #[serde(default)]
    pub failures: BTreeMap<String, String>,
    pub outcome: RetentionOutcome,
}

impl RetentionRun {
    pub fn total_removed(&self) -> usize {
        self.items_removed.values().sum()
    }

    /// 生成简短摘要文本（写入审计描述）
    pub fn summary_text(&self) -> String {
        let parts: Vec<String> = self
            .items_removed
            .iter()
            .map(|(category, count)| format!("{}={}", category, count))
            .collect();

        let mut text = format!(
            "数据保留任务({})完成: {} [{}], 耗时{}ms",
            self.trigger,
            self.outcome,
            parts.join(", "),
            self.duration_ms
        );
        if !self.failures.is_empty() {
            let failed: Vec<&str> = self.failures.keys().map(|k| k.as_str()).collect();
            text.push_str(&format!(", 失败类别: {}", failed.join(", ")));
        }
        text
    }
}

// ==========================================
// SchedulerStatus - 调度器状态（管理界面消费）
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub active: bool,
    pub state: SchedulerState,
    pub cron_expression: Option<String>,
    pub timezone: Option<String>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run: Option<RetentionRun>,
}
