// ==========================================
// 数据保留任务集成测试
// ==========================================
// 测试范围:
// 1. 人工触发: 三类数据按各自月数清理, 审计一次
// 2. 幂等: 连续执行第二次不再删除
// 3. 调度: 启动 / 定时触发 / 停止 / 重配置持久化
// ==========================================

mod test_helpers;

use arcflow_core::api::ApiError;
use arcflow_core::config::config_keys;
use arcflow_core::domain::{BudgetVersion, RetentionOutcome, RunTrigger, SchedulerState};
use arcflow_core::engine::retention::{
    AUDIT_CATEGORY_RETENTION, CATEGORY_APP_LOG, CATEGORY_AUDIT_LOG, CATEGORY_BUDGET_HISTORY,
    SYSTEM_ACTOR,
};
use arcflow_core::app::AppState;
use std::time::Duration;
use test_helpers::*;

/// 每类写入一条过期记录与一条新记录
fn seed_rows(state: &AppState) {
    let params = project_params(150.0, &["ARQUITETURA"]);
    let result = state.budget_api.calculate("office-1", &params).unwrap();

    let mut old = BudgetVersion::draft("office-1", "budget-1", params.clone(), result.clone(), "alice");
    old.created_at = months_ago(13);
    state.budget_history_repo.insert_next_version(&old).unwrap();
    let fresh = BudgetVersion::draft("office-1", "budget-1", params, result, "alice");
    state.budget_history_repo.insert_next_version(&fresh).unwrap();

    state.audit_log_repo.insert(&aged_audit_entry(25)).unwrap();
    state.audit_log_repo.insert(&aged_audit_entry(1)).unwrap();

    state.app_log_repo.append(&aged_app_log(7)).unwrap();
}

#[tokio::test]
async fn test_run_now_清理三类数据() {
    let (_tmp, state) = create_test_state().expect("无法创建测试环境");
    seed_rows(&state);

    let run = state.retention_api.run_now().await;

    assert_eq!(run.trigger, RunTrigger::Manual);
    assert_eq!(run.outcome, RetentionOutcome::Success);
    assert!(run.failures.is_empty());
    assert_eq!(run.items_removed[CATEGORY_BUDGET_HISTORY], 1);
    assert_eq!(run.items_removed[CATEGORY_AUDIT_LOG], 1);
    // app_log: 过期一条; calculate 写入的新日志保留
    assert_eq!(run.items_removed[CATEGORY_APP_LOG], 1);
    assert!(run.finished_at >= run.started_at);

    let versions = state.budget_api.list_versions("office-1", "budget-1").unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version_no, 2);
    assert_eq!(state.app_log_repo.find_recent(10).unwrap().len(), 1);

    let audits = state
        .audit_log_repo
        .find_by_category(AUDIT_CATEGORY_RETENTION, 10)
        .unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].actor_id, SYSTEM_ACTOR);
    assert_eq!(audits[0].action, "RETENTION_RUN");
    assert!(audits[0].after_json.is_some());
}

#[tokio::test]
async fn test_run_now_幂等() {
    let (_tmp, state) = create_test_state().expect("无法创建测试环境");
    seed_rows(&state);

    let first = state.retention_api.run_now().await;
    let second = state.retention_api.run_now().await;

    assert_eq!(first.total_removed(), 3);
    assert_eq!(second.total_removed(), 0);
    assert_ne!(first.run_id, second.run_id);

    // 每次执行各写一条审计
    assert_eq!(
        state
            .audit_log_repo
            .find_by_category(AUDIT_CATEGORY_RETENTION, 10)
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        state.retention_api.status().last_run.map(|r| r.run_id),
        Some(second.run_id)
    );
}

#[tokio::test]
async fn test_月数配置生效() {
    let (tmp, state) = create_test_state().expect("无法创建测试环境");
    state
        .config_manager
        .update_config(config_keys::RETENTION_APP_LOG_MONTHS, "12")
        .unwrap();
    drop(state);

    // 月数在装配时读取
    let state = AppState::new(tmp.path().to_string_lossy().to_string()).unwrap();
    state.app_log_repo.append(&aged_app_log(7)).unwrap();

    let policy = state
        .retention_api
        .policies()
        .into_iter()
        .find(|p| p.category == CATEGORY_APP_LOG)
        .unwrap();
    assert_eq!(policy.max_age_months, 12);

    let run = state.retention_api.run_now().await;
    assert_eq!(run.items_removed[CATEGORY_APP_LOG], 0);
}

#[tokio::test]
async fn test_调度启动与停止() {
    let (_tmp, state) = create_test_state().expect("无法创建测试环境");
    let api = &state.retention_api;

    assert_eq!(api.status().state, SchedulerState::Idle);
    assert!(!api.status().active);

    assert!(api.start("* * * * * *", "UTC").await.unwrap());
    // 重复启动无变更
    assert!(!api.start("* * * * * *", "UTC").await.unwrap());

    let mut waited = 0;
    while api.status().last_run.is_none() && waited < 50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        waited += 1;
    }
    let last = api.status().last_run.expect("定时触发未执行");
    assert_eq!(last.trigger, RunTrigger::Scheduled);

    assert!(api.stop().await);
    assert_eq!(api.status().state, SchedulerState::Stopped);
    assert!(api.status().next_run_at.is_none());
    assert!(!api.stop().await);
}

#[tokio::test]
async fn test_默认配置启动() {
    let (_tmp, state) = create_test_state().expect("无法创建测试环境");

    assert!(state.retention_api.start_from_config().await.unwrap());
    let status = state.retention_api.status();
    assert_eq!(status.state, SchedulerState::Scheduled);
    assert_eq!(status.cron_expression.as_deref(), Some("0 2 * * *"));
    assert_eq!(status.timezone.as_deref(), Some("America/Sao_Paulo"));

    // 下次触发时间由定时任务异步写入
    let mut waited = 0;
    while state.retention_api.status().next_run_at.is_none() && waited < 20 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        waited += 1;
    }
    assert!(state.retention_api.status().next_run_at.is_some());

    state.retention_api.stop().await;
}

#[tokio::test]
async fn test_无效表达式() {
    let (_tmp, state) = create_test_state().expect("无法创建测试环境");
    let api = &state.retention_api;

    assert!(matches!(
        api.start("61 * * * *", "UTC").await,
        Err(ApiError::SchedulerConfigError(_))
    ));
    assert!(matches!(
        api.start("0 2 * * *", "Nowhere/City").await,
        Err(ApiError::SchedulerConfigError(_))
    ));
    assert_eq!(api.status().state, SchedulerState::Idle);
}

#[tokio::test]
async fn test_重配置持久化() {
    let (_tmp, state) = create_test_state().expect("无法创建测试环境");
    let api = &state.retention_api;

    api.start_from_config().await.unwrap();

    let status = api.reconfigure("30 3 * * *").await.unwrap();
    assert_eq!(status.cron_expression.as_deref(), Some("30 3 * * *"));
    assert_eq!(status.timezone.as_deref(), Some("America/Sao_Paulo"));
    assert_eq!(
        state.config_manager.get_retention_settings().unwrap().cron_expression,
        "30 3 * * *"
    );

    // 无效表达式: 旧计划与已保存配置均不变
    assert!(api.reconfigure("not a cron").await.is_err());
    assert_eq!(api.status().cron_expression.as_deref(), Some("30 3 * * *"));
    assert_eq!(
        state.config_manager.get_retention_settings().unwrap().cron_expression,
        "30 3 * * *"
    );

    api.stop().await;
}

#[tokio::test]
async fn test_重配置保存失败不改动计划() {
    let (_tmp, state) = create_test_state().expect("无法创建测试环境");
    let api = &state.retention_api;
    api.start_from_config().await.unwrap();

    // 另开连接删除配置表, 使保存失败
    let other = rusqlite::Connection::open(&state.db_path).unwrap();
    other.execute_batch("DROP TABLE config_kv;").unwrap();

    assert!(matches!(
        api.reconfigure("30 3 * * *").await,
        Err(ApiError::InternalError(_))
    ));
    let status = api.status();
    assert_eq!(status.state, SchedulerState::Scheduled);
    assert_eq!(status.cron_expression.as_deref(), Some("0 2 * * *"));

    api.stop().await;
}
