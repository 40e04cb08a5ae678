// ==========================================
// ArcFlow - 数据保留清理例程
// ==========================================
// 职责: 依次执行各清理类别, 汇总为 RetentionRun 并写入审计
// ==========================================
// 红线: 单类别失败只记录日志并计 0, 不影响后续类别
// 红线: 审计写入失败只记录日志, 例程永远返回摘要, 不得使宿主进程崩溃
// ==========================================
// 说明: Engine 层定义 RecordPurger / AuditSink trait, 仓储层实现
// ==========================================

use crate::domain::retention::RetentionRun;
use crate::domain::types::{RetentionOutcome, RunTrigger};
use async_trait::async_trait;
use chrono::{DateTime, Months, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// 预算版本历史清理类别
pub const CATEGORY_BUDGET_HISTORY: &str = "budget_version_history";
/// 审计日志清理类别
pub const CATEGORY_AUDIT_LOG: &str = "audit_log";
/// 应用日志清理类别
pub const CATEGORY_APP_LOG: &str = "app_log";

/// 审计类别
pub const AUDIT_CATEGORY_RETENTION: &str = "retention";
/// 系统任务操作人
pub const SYSTEM_ACTOR: &str = "system";

// ==========================================
// 错误类型（仅内部使用, 不向外传播）
// ==========================================

#[derive(Error, Debug)]
#[error("清理失败: {0}")]
pub struct PurgeCategoryError(pub String);

#[derive(Error, Debug)]
#[error("审计写入失败: {0}")]
pub struct AuditWriteError(pub String);

// ==========================================
// 协作者 Trait
// ==========================================

/// 按时间阈值删除历史记录
#[async_trait]
pub trait RecordPurger: Send + Sync {
    /// 删除早于 threshold (UTC) 的记录, 返回删除条数
    async fn purge_older_than(&self, threshold: NaiveDateTime) -> Result<usize, PurgeCategoryError>;
}

/// 审计落地
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(
        &self,
        category: &str,
        action: &str,
        actor_id: &str,
        before: Option<JsonValue>,
        after: Option<JsonValue>,
        description: &str,
    ) -> Result<(), AuditWriteError>;
}

// ==========================================
// RetentionPolicy - 清理策略
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPolicy {
    pub category: String,
    pub max_age_months: u32,
}

impl RetentionPolicy {
    /// 计算清理阈值: now - max_age_months
    pub fn threshold(&self, now: DateTime<Utc>) -> Option<NaiveDateTime> {
        now.checked_sub_months(Months::new(self.max_age_months))
            .map(|dt| dt.naive_utc())
    }
}

struct RetentionCategory {
    policy: RetentionPolicy,
    purger: Arc<dyn RecordPurger>,
}

// ==========================================
// RetentionRoutine - 清理例程
// ==========================================
pub struct RetentionRoutine {
    categories: Vec<RetentionCategory>,
    audit_sink: Arc<dyn AuditSink>,
}

impl RetentionRoutine {
    /// 创建清理例程（尚未注册任何类别）
    pub fn new(audit_sink: Arc<dyn AuditSink>) -> Self {
        Self {
            categories: Vec::new(),
            audit_sink,
        }
    }

    /// 注册清理类别（按注册顺序执行）
    pub fn with_category(
        mut self,
        category: &str,
        max_age_months: u32,
        purger: Arc<dyn RecordPurger>,
    ) -> Self {
        self.categories.push(RetentionCategory {
            policy: RetentionPolicy {
                category: category.to_string(),
                max_age_months,
            },
            purger,
        });
        self
    }

    /// 已注册的清理策略
    pub fn policies(&self) -> Vec<RetentionPolicy> {
        self.categories.iter().map(|c| c.policy.clone()).collect()
    }

    /// 以当前时间执行清理
    pub async fn run(&self, trigger: RunTrigger) -> RetentionRun {
        self.run_at(Utc::now(), trigger).await
    }

    /// 以指定时间执行清理
    ///
    /// # 返回
    /// 总是返回 RetentionRun（失败类别计 0 并记录原因）
    #[instrument(skip(self), fields(categories = self.categories.len()))]
    pub async fn run_at(&self, now: DateTime<Utc>, trigger: RunTrigger) -> RetentionRun {
        let clock = Instant::now();
        let mut items_removed = BTreeMap::new();
        let mut failures = BTreeMap::new();

        info!("数据保留任务开始: trigger={}", trigger);

        for category in &self.categories {
            let key = category.policy.category.clone();

            let result = match category.policy.threshold(now) {
                Some(threshold) => category.purger.purge_older_than(threshold).await,
                None => Err(PurgeCategoryError(format!(
                    "无法计算阈值: max_age_months={}",
                    category.policy.max_age_months
                ))),
            };

            match result {
                Ok(count) => {
                    info!("清理类别 {} 完成: 删除{}条", key, count);
                    items_removed.insert(key, count);
                }
                Err(e) => {
                    error!("清理类别 {} 失败(计0, 继续后续类别): {}", key, e);
                    items_removed.insert(key.clone(), 0);
                    failures.insert(key, e.to_string());
                }
            }
        }

        let elapsed = clock.elapsed();
        let finished_at = now + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());

        let outcome = if failures.is_empty() {
            RetentionOutcome::Success
        } else {
            RetentionOutcome::PartialFailure
        };

        let run = RetentionRun {
            run_id: uuid::Uuid::new_v4().to_string(),
            trigger,
            started_at: now,
            finished_at,
            duration_ms: elapsed.as_millis() as i64,
            items_removed,
            failures,
            outcome,
        };

        self.write_audit(&run).await;

        info!(
            "数据保留任务结束: outcome={}, removed={}, duration_ms={}",
            run.outcome,
            run.total_removed(),
            run.duration_ms
        );

        run
    }

    async fn write_audit(&self, run: &RetentionRun) {
        let after = match serde_json::to_value(run) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("RetentionRun 序列化失败: {}", e);
                None
            }
        };

        if let Err(e) = self
            .audit_sink
            .record(
                AUDIT_CATEGORY_RETENTION,
                crate::domain::audit_log::AuditAction::RetentionRun.as_str(),
                SYSTEM_ACTOR,
                None,
                after,
                &run.summary_text(),
            )
            .await
        {
            error!("数据保留任务审计写入失败(忽略): {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedPurger {
        count: usize,
        thresholds: Mutex<Vec<NaiveDateTime>>,
    }

    impl FixedPurger {
        fn new(count: usize) -> Arc<Self> {
            Arc::new(Self {
                count,
                thresholds: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RecordPurger for FixedPurger {
        async fn purge_older_than(&self, threshold: NaiveDateTime) -> Result<usize, PurgeCategoryError> {
            self.thresholds.lock().unwrap().push(threshold);
            Ok(self.count)
        }
    }

    struct FailingPurger;

    #[async_trait]
    impl RecordPurger for FailingPurger {
        async fn purge_older_than(&self, _threshold: NaiveDateTime) -> Result<usize, PurgeCategoryError> {
            Err(PurgeCategoryError("connection reset".to_string()))
        }
    }

    #[derive(Default)]
    struct CountingSink {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AuditSink for CountingSink {
        async fn record(
            &self,
            _category: &str,
            _action: &str,
            _actor_id: &str,
            _before: Option<JsonValue>,
            _after: Option<JsonValue>,
            _description: &str,
        ) -> Result<(), AuditWriteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AuditWriteError("disk full".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_thresholds_follow_policy_ages() {
        let sink = Arc::new(CountingSink::default());
        let history = FixedPurger::new(3);
        let audit = FixedPurger::new(1);
        let routine = RetentionRoutine::new(sink.clone())
            .with_category(CATEGORY_BUDGET_HISTORY, 12, history.clone())
            .with_category(CATEGORY_AUDIT_LOG, 24, audit.clone());

        let now = Utc.with_ymd_and_hms(2026, 3, 31, 2, 0, 0).unwrap();
        let run = routine.run_at(now, RunTrigger::Manual).await;

        assert_eq!(run.outcome, RetentionOutcome::Success);
        assert_eq!(run.total_removed(), 4);
        assert_eq!(
            history.thresholds.lock().unwrap()[0],
            Utc.with_ymd_and_hms(2025, 3, 31, 2, 0, 0).unwrap().naive_utc()
        );
        assert_eq!(
            audit.thresholds.lock().unwrap()[0],
            Utc.with_ymd_and_hms(2024, 3, 31, 2, 0, 0).unwrap().naive_utc()
        );
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_isolated() {
        let sink = Arc::new(CountingSink::default());
        let routine = RetentionRoutine::new(sink.clone())
            .with_category(CATEGORY_BUDGET_HISTORY, 12, FixedPurger::new(5))
            .with_category(CATEGORY_AUDIT_LOG, 24, Arc::new(FailingPurger))
            .with_category(CATEGORY_APP_LOG, 6, FixedPurger::new(7));

        let run = routine.run(RunTrigger::Manual).await;

        assert_eq!(run.outcome, RetentionOutcome::PartialFailure);
        assert_eq!(run.items_removed[CATEGORY_BUDGET_HISTORY], 5);
        assert_eq!(run.items_removed[CATEGORY_AUDIT_LOG], 0);
        assert_eq!(run.items_removed[CATEGORY_APP_LOG], 7);
        assert!(run.failures[CATEGORY_AUDIT_LOG].contains("connection reset"));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_run() {
        let sink = Arc::new(CountingSink {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let routine = RetentionRoutine::new(sink.clone())
            .with_category(CATEGORY_APP_LOG, 6, FixedPurger::new(2));

        let run = routine.run(RunTrigger::Scheduled).await;
        assert_eq!(run.outcome, RetentionOutcome::Success);
        assert_eq!(run.total_removed(), 2);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_summary_text_lists_failures() {
        let mut items = BTreeMap::new();
        items.insert("a".to_string(), 1);
        items.insert("b".to_string(), 0);
        let mut failures = BTreeMap::new();
        failures.insert("b".to_string(), "boom".to_string());
        let now = Utc::now();
        let run = RetentionRun {
            run_id: "r1".to_string(),
            trigger: RunTrigger::Manual,
            started_at: now,
            finished_at: now,
            duration_ms: 3,
            items_removed: items,
            failures,
            outcome: RetentionOutcome::PartialFailure,
        };
        let text = run.summary_text();
        assert!(text.contains("a=1"));
        assert!(text.contains("失败类别: b"));
    }
}
