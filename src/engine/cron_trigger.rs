// ==========================================
// ArcFlow - Cron 定时触发器
// ==========================================
// 职责: cron 表达式解析 + 基于 tokio 的定时触发原语
// 约定: 5 段表达式 (分 时 日 月 周) 自动补秒位 "0"
// 说明: 触发时间在配置时区下计算, 对外统一为 UTC
// ==========================================

use crate::engine::scheduler::{ArmedSchedule, SchedulePrimitive, SchedulerError, TickFn};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// ==========================================
// CronSchedule - 已解析的定时计划
// ==========================================
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    timezone_name: String,
    timezone: Tz,
    schedule: cron::Schedule,
}

impl CronSchedule {
    /// 解析 cron 表达式与 IANA 时区
    ///
    /// # 错误
    /// - `InvalidCron`: 表达式无法解析
    /// - `InvalidTimezone`: 时区名未知
    pub fn parse(expression: &str, timezone: &str) -> Result<Self, SchedulerError> {
        let expression = expression.trim();
        let timezone_name = timezone.trim();

        let tz = Tz::from_str(timezone_name).map_err(|e| SchedulerError::InvalidTimezone {
            timezone: timezone_name.to_string(),
            reason: e.to_string(),
        })?;

        let normalized = normalize_expression(expression)?;
        let schedule = cron::Schedule::from_str(&normalized).map_err(|e| SchedulerError::InvalidCron {
            expression: expression.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            expression: expression.to_string(),
            timezone_name: timezone_name.to_string(),
            timezone: tz,
            schedule,
        })
    }

    /// 原始表达式（未补秒位）
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn timezone(&self) -> &str {
        &self.timezone_name
    }

    /// 严格晚于 after 的下一次触发时间
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&after.with_timezone(&self.timezone))
            .next()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn normalize_expression(expression: &str) -> Result<String, SchedulerError> {
    let fields = expression.split_whitespace().count();
    match fields {
        5 => Ok(format!("0 {}", expression)),
        6 | 7 => Ok(expression.to_string()),
        _ => Err(SchedulerError::InvalidCron {
            expression: expression.to_string(),
            reason: format!("字段数应为 5/6/7, 实际 {}", fields),
        }),
    }
}

// ==========================================
// TokioCronPrimitive - tokio 定时原语
// ==========================================
// 每个已装配计划对应一个 tokio 任务: 睡眠到下次触发 → 执行 tick → 循环
// tick 串行执行, 上一次 tick 未返回前不会计算下一次触发
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCronPrimitive;

impl TokioCronPrimitive {
    pub fn new() -> Self {
        Self
    }
}

impl SchedulePrimitive for TokioCronPrimitive {
    fn arm(&self, schedule: CronSchedule, tick: TickFn) -> Box<dyn ArmedSchedule> {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let next_fire: Arc<Mutex<Option<DateTime<Utc>>>> = Arc::new(Mutex::new(None));
        let next_slot = next_fire.clone();

        info!(
            "装配定时计划: cron={}, tz={}",
            schedule.expression(),
            schedule.timezone()
        );

        let handle = tokio::spawn(async move {
            loop {
                if *stop_rx.borrow() {
                    break;
                }

                let Some(next_at) = schedule.next_after(Utc::now()) else {
                    warn!("定时计划没有后续触发时间: cron={}", schedule.expression());
                    break;
                };
                set_slot(&next_slot, Some(next_at));

                let wait = (next_at - Utc::now())
                    .to_std()
                    .unwrap_or(std::time::Duration::ZERO);

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    // 收到停止信号或发送端已释放
                    _ = stop_rx.changed() => break,
                }

                if *stop_rx.borrow() {
                    break;
                }

                debug!("定时计划触发: cron={}, at={}", schedule.expression(), next_at);
                tick().await;
            }

            set_slot(&next_slot, None);
        });

        Box::new(TokioArmedSchedule {
            stop_tx,
            next_fire,
            handle,
        })
    }
}

fn set_slot(slot: &Mutex<Option<DateTime<Utc>>>, value: Option<DateTime<Utc>>) {
    match slot.lock() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => *poisoned.into_inner() = value,
    }
}

struct TokioArmedSchedule {
    stop_tx: watch::Sender<bool>,
    next_fire: Arc<Mutex<Option<DateTime<Utc>>>>,
    handle: JoinHandle<()>,
}

impl ArmedSchedule for TokioArmedSchedule {
    fn disarm(&self) {
        // 任务已退出时接收端已释放, 发送失败可忽略
        let _ = self.stop_tx.send(true);
    }

    fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        if self.handle.is_finished() {
            return None;
        }
        self.next_fire.lock().ok().and_then(|guard| *guard)
    }
}
