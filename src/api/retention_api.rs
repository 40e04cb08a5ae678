// ==========================================
// ArcFlow - 数据保留任务 API
// ==========================================
// 职责: 调度器状态查询、人工触发、启停与重配置 (供管理界面调用)
// 说明: 默认 cron / 时区来自 ConfigManager (retention/*)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_keys;
use crate::config::config_manager::ConfigManager;
use crate::config::retention_settings::RetentionSettings;
use crate::domain::retention::{RetentionRun, SchedulerStatus};
use crate::engine::cron_trigger::CronSchedule;
use crate::engine::retention::RetentionPolicy;
use crate::engine::scheduler::{RecurringJob, RetentionScheduler};
use std::sync::Arc;
use tracing::info;

pub struct RetentionApi {
    scheduler: Arc<RetentionScheduler>,
    config_manager: Arc<ConfigManager>,
}

impl RetentionApi {
    pub fn new(scheduler: Arc<RetentionScheduler>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            scheduler,
            config_manager,
        }
    }

    fn settings(&self) -> ApiResult<RetentionSettings> {
        self.config_manager
            .get_retention_settings()
            .map_err(|e| ApiError::InternalError(format!("读取数据保留配置失败: {}", e)))
    }

    /// 调度器状态
    pub fn status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    /// 已注册的清理策略
    pub fn policies(&self) -> Vec<RetentionPolicy> {
        self.scheduler.routine().policies()
    }

    /// 人工触发一次清理, 同步返回执行摘要
    pub async fn run_now(&self) -> RetentionRun {
        self.scheduler.run_manually().await
    }

    /// 按已保存配置启动调度
    ///
    /// # 返回
    /// - `Ok(true)`: 已启动
    /// - `Ok(false)`: 已在运行, 未做变更
    pub async fn start_from_config(&self) -> ApiResult<bool> {
        let settings = self.settings()?;
        self.start(&settings.cron_expression, &settings.timezone).await
    }

    /// 以指定表达式启动调度
    pub async fn start(&self, cron_expression: &str, timezone: &str) -> ApiResult<bool> {
        Ok(self.scheduler.start(cron_expression, timezone).await?)
    }

    /// 停止调度（进行中的执行会完成）
    pub async fn stop(&self) -> bool {
        self.scheduler.stop().await
    }

    /// 替换 cron 表达式并持久化
    ///
    /// 顺序: 校验 → 保存 → 重新装配
    /// 表达式无效或保存失败时旧计划保持不变
    pub async fn reconfigure(&self, cron_expression: &str) -> ApiResult<SchedulerStatus> {
        let timezone = match self.scheduler.status().timezone {
            Some(tz) => tz,
            None => self.settings()?.timezone,
        };
        CronSchedule::parse(cron_expression, &timezone)?;

        self.config_manager
            .update_config(config_keys::RETENTION_CRON, cron_expression.trim())
            .map_err(|e| ApiError::InternalError(format!("保存 cron 配置失败: {}", e)))?;

        self.scheduler.reconfigure(cron_expression).await?;

        info!("数据保留 cron 已更新并保存: {}", cron_expression.trim());
        Ok(self.scheduler.status())
    }
}
