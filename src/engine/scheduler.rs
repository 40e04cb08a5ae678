// ==========================================
// ArcFlow - 数据保留调度器
// ==========================================
// 状态机: IDLE → SCHEDULED → RUNNING → SCHEDULED (循环) 或 STOPPED
// ==========================================
// 红线: 任一时刻至多一个有效定时计划
// 红线: 已被替换/停止的计划 (旧 generation) 触发一律忽略
// 红线: RUNNING 期间到达的定时触发直接丢弃, 不排队
// 红线: stop() 不取消进行中的执行, 仅阻止后续触发
// 红线: 只有置为 RUNNING 的那次执行可以将状态恢复为 SCHEDULED
// ==========================================
// 说明: 定时原语经 SchedulePrimitive 注入, 测试可替换为记录型实现
// ==========================================

use crate::domain::retention::{RetentionRun, SchedulerStatus};
use crate::domain::types::{RunTrigger, SchedulerState};
use crate::engine::cron_trigger::CronSchedule;
use crate::engine::retention::RetentionRoutine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 错误类型
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("无效的 cron 表达式 '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error("无效的时区 '{timezone}': {reason}")]
    InvalidTimezone { timezone: String, reason: String },
}

// ==========================================
// 定时原语 Trait
// ==========================================

/// 触发回调
pub type TickFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// 定时原语: 按计划反复调用 tick
pub trait SchedulePrimitive: Send + Sync {
    fn arm(&self, schedule: CronSchedule, tick: TickFn) -> Box<dyn ArmedSchedule>;
}

/// 已装配的计划句柄
pub trait ArmedSchedule: Send + Sync {
    /// 撤销计划 (幂等)
    fn disarm(&self);
    fn next_fire_at(&self) -> Option<DateTime<Utc>>;
}

// ==========================================
// RecurringJob - 周期任务接口
// ==========================================
#[async_trait]
pub trait RecurringJob: Send + Sync {
    type Output: Send;

    /// 启动定时计划; 已在运行时返回 Ok(false)
    async fn start(&self, cron_expression: &str, timezone: &str) -> Result<bool, SchedulerError>;

    /// 停止定时计划; 本就未运行时返回 false
    async fn stop(&self) -> bool;

    /// 原子替换定时计划; 表达式无效时旧计划保持不变
    async fn reconfigure(&self, cron_expression: &str) -> Result<(), SchedulerError>;

    /// 立即执行一次 (与调度状态无关)
    async fn run_now(&self) -> Self::Output;

    fn status(&self) -> SchedulerStatus;
}

// ==========================================
// 共享状态
// ==========================================
struct SchedulerShared {
    state: SchedulerState,
    /// 每次装配/撤销 +1, tick 携带装配时的值
    generation: u64,
    schedule: Option<CronSchedule>,
    armed: Option<Box<dyn ArmedSchedule>>,
    last_run: Option<RetentionRun>,
    /// 定时执行序号, 每次进入 RUNNING +1
    run_seq: u64,
    /// 当前持有 RUNNING 的执行序号
    running_run: Option<u64>,
}

fn lock_shared(shared: &Mutex<SchedulerShared>) -> MutexGuard<'_, SchedulerShared> {
    // 状态机字段均为简单赋值, 中毒后继续使用内部值
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ==========================================
// RetentionScheduler - 数据保留调度器
// ==========================================
pub struct RetentionScheduler {
    routine: Arc<RetentionRoutine>,
    primitive: Arc<dyn SchedulePrimitive>,
    shared: Arc<Mutex<SchedulerShared>>,
    default_timezone: String,
}

impl RetentionScheduler {
    /// 创建调度器（初始状态 IDLE）
    ///
    /// # 参数
    /// - routine: 清理例程
    /// - primitive: 定时原语
    /// - default_timezone: reconfigure 时尚无计划可继承时区时使用
    pub fn new(
        routine: Arc<RetentionRoutine>,
        primitive: Arc<dyn SchedulePrimitive>,
        default_timezone: &str,
    ) -> Self {
        Self {
            routine,
            primitive,
            shared: Arc::new(Mutex::new(SchedulerShared {
                state: SchedulerState::Idle,
                generation: 0,
                schedule: None,
                armed: None,
                last_run: None,
                run_seq: 0,
                running_run: None,
            })),
            default_timezone: default_timezone.to_string(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        lock_shared(&self.shared).state
    }

    /// 清理例程（只读访问策略）
    pub fn routine(&self) -> &RetentionRoutine {
        &self.routine
    }

    /// 人工触发: 任何状态下均可执行, 同步返回执行摘要
    ///
    /// 不改变调度状态; 与定时执行重叠时两者都会执行 (清理按时间阈值幂等)
    #[instrument(skip(self))]
    pub async fn run_manually(&self) -> RetentionRun {
        let run = self.routine.run(RunTrigger::Manual).await;
        lock_shared(&self.shared).last_run = Some(run.clone());
        run
    }

    fn make_tick(&self, generation: u64) -> TickFn {
        let weak = Arc::downgrade(&self.shared);
        let routine = self.routine.clone();
        Arc::new(move || {
            let weak = weak.clone();
            let routine = routine.clone();
            Box::pin(on_tick(weak, routine, generation))
        })
    }

    /// 装配新计划, 撤销旧计划 (调用方持有锁)
    fn arm_locked(&self, shared: &mut SchedulerShared, schedule: CronSchedule) {
        if let Some(old) = shared.armed.take() {
            old.disarm();
        }
        shared.generation += 1;
        let armed = self
            .primitive
            .arm(schedule.clone(), self.make_tick(shared.generation));
        shared.armed = Some(armed);
        shared.schedule = Some(schedule);
    }
}

/// 定时触发处理
async fn on_tick(shared: Weak<Mutex<SchedulerShared>>, routine: Arc<RetentionRoutine>, generation: u64) {
    // 调度器已释放
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let run_no = {
        let mut guard = lock_shared(&shared);
        if guard.generation != generation {
            debug!(
                "忽略已失效计划的触发: tick_generation={}, current={}",
                generation, guard.generation
            );
            return;
        }
        let current = guard.state;
        match current {
            SchedulerState::Scheduled => {
                guard.state = SchedulerState::Running;
                guard.run_seq += 1;
                guard.running_run = Some(guard.run_seq);
            }
            SchedulerState::Running => {
                warn!("上一次数据保留任务仍在执行, 丢弃本次定时触发");
                return;
            }
            SchedulerState::Idle | SchedulerState::Stopped => {
                debug!("调度器状态为 {}, 忽略定时触发", current);
                return;
            }
        }
        guard.run_seq
    };

    let run = routine.run(RunTrigger::Scheduled).await;

    let mut guard = lock_shared(&shared);
    // 执行期间被 stop() 时保持 STOPPED; stop → start 后新计划的执行已持有 RUNNING 时不改动
    if guard.running_run == Some(run_no) {
        guard.running_run = None;
        if guard.state == SchedulerState::Running {
            guard.state = SchedulerState::Scheduled;
        }
    }
    guard.last_run = Some(run);
}

#[async_trait]
impl RecurringJob for RetentionScheduler {
    type Output = RetentionRun;

    #[instrument(skip(self))]
    async fn start(&self, cron_expression: &str, timezone: &str) -> Result<bool, SchedulerError> {
        let mut guard = lock_shared(&self.shared);
        if guard.state.is_active() {
            info!("调度器已处于 {} 状态, 忽略重复启动", guard.state);
            return Ok(false);
        }

        let schedule = CronSchedule::parse(cron_expression, timezone)?;
        self.arm_locked(&mut guard, schedule);
        guard.state = SchedulerState::Scheduled;

        info!(
            "数据保留调度器已启动: cron={}, tz={}",
            cron_expression.trim(),
            timezone.trim()
        );
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> bool {
        let mut guard = lock_shared(&self.shared);
        if !guard.state.is_active() {
            debug!("调度器状态为 {}, 无需停止", guard.state);
            return false;
        }

        if let Some(armed) = guard.armed.take() {
            armed.disarm();
        }
        guard.generation += 1;
        guard.state = SchedulerState::Stopped;
        guard.running_run = None;

        info!("数据保留调度器已停止");
        true
    }

    #[instrument(skip(self))]
    async fn reconfigure(&self, cron_expression: &str) -> Result<(), SchedulerError> {
        let mut guard = lock_shared(&self.shared);

        let timezone = guard
            .schedule
            .as_ref()
            .map(|s| s.timezone().to_string())
            .unwrap_or_else(|| self.default_timezone.clone());

        // 先校验, 失败时旧计划原样保留
        let schedule = CronSchedule::parse(cron_expression, &timezone)?;

        self.arm_locked(&mut guard, schedule);
        if guard.state != SchedulerState::Running {
            guard.state = SchedulerState::Scheduled;
        }

        info!("数据保留调度器已重配置: cron={}, tz={}", cron_expression.trim(), timezone);
        Ok(())
    }

    async fn run_now(&self) -> RetentionRun {
        self.run_manually().await
    }

    fn status(&self) -> SchedulerStatus {
        let guard = lock_shared(&self.shared);
        let next_run_at = if guard.state.is_active() {
            guard.armed.as_ref().and_then(|a| a.next_fire_at())
        } else {
            None
        };

        SchedulerStatus {
            active: guard.state.is_active(),
            state: guard.state,
            cron_expression: guard.schedule.as_ref().map(|s| s.expression().to_string()),
            timezone: guard.schedule.as_ref().map(|s| s.timezone().to_string()),
            next_run_at,
            last_run: guard.last_run.clone(),
        }
    }
}

impl Drop for RetentionScheduler {
    fn drop(&mut self) {
        if let Some(armed) = lock_shared(&self.shared).armed.take() {
            armed.disarm();
        }
    }
}
