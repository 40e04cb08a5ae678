// ==========================================
// ArcFlow - 宿主进程入口
// ==========================================
// 职责: 初始化日志与 AppState, 按配置启动数据保留调度, 等待退出信号
// 用法: arcflow-core [db_path]
// ==========================================

use anyhow::{anyhow, Context};
use arcflow_core::app::{get_default_db_path, AppState};
use arcflow_core::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 预算引擎与数据保留调度", arcflow_core::APP_NAME);
    tracing::info!("系统版本: {}", arcflow_core::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e)).context("无法初始化AppState")?;

    let settings = state
        .config_manager
        .get_retention_settings()
        .map_err(|e| anyhow!(e.to_string()))
        .context("读取数据保留配置失败")?;

    if settings.enabled {
        state
            .retention_api
            .start(&settings.cron_expression, &settings.timezone)
            .await
            .context("启动数据保留调度失败")?;
        let status = state.retention_api.status();
        tracing::info!(
            "数据保留调度已启动: cron={}, tz={}, next={:?}",
            settings.cron_expression,
            settings.timezone,
            status.next_run_at
        );
    } else {
        tracing::info!("数据保留调度已禁用 (retention/enabled=false)");
    }

    tokio::signal::ctrl_c().await.context("等待退出信号失败")?;

    tracing::info!("收到退出信号, 停止数据保留调度");
    state.retention_api.stop().await;
    Ok(())
}
