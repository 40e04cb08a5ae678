// ==========================================
// ArcFlow - 应用状态
// ==========================================
// 职责: 装配共享连接、仓储、引擎与 API 实例
// 说明: 宿主进程 (main / run_retention) 持有唯一 AppState
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{BudgetApi, BudgetConfigApi, CatalogApi, RetentionApi};
use crate::config::config_manager::ConfigManager;
use crate::config::retention_settings::RetentionSettings;
use crate::engine::cron_trigger::TokioCronPrimitive;
use crate::engine::retention::{
    RetentionRoutine, CATEGORY_APP_LOG, CATEGORY_AUDIT_LOG, CATEGORY_BUDGET_HISTORY,
};
use crate::engine::scheduler::{RetentionScheduler, SchedulePrimitive};
use crate::repository::{
    AppLogRepository, AuditLogRepository, BudgetConfigRepository, BudgetHistoryRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 学科目录API
    pub catalog_api: Arc<CatalogApi>,

    /// 租户预算配置API
    pub budget_config_api: Arc<BudgetConfigApi>,

    /// 预算计算API
    pub budget_api: Arc<BudgetApi>,

    /// 数据保留任务API
    pub retention_api: Arc<RetentionApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 保留任务调度器
    pub retention_scheduler: Arc<RetentionScheduler>,

    /// 审计日志仓储（用于审计追踪查询）
    pub audit_log_repo: Arc<AuditLogRepository>,

    /// 应用日志仓储
    pub app_log_repo: Arc<AppLogRepository>,

    /// 预算版本历史仓储
    pub budget_history_repo: Arc<BudgetHistoryRepository>,
}

impl AppState {
    /// 创建新的AppState实例（使用 tokio 定时原语）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 只装配, 不启动调度; 是否启动由宿主根据 retention/enabled 决定
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_schedule_primitive(db_path, Arc::new(TokioCronPrimitive::new()))
    }

    /// 创建AppState并指定定时原语
    pub fn with_schedule_primitive(
        db_path: String,
        primitive: Arc<dyn SchedulePrimitive>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::ensure_schema_version(&conn)
            .map_err(|e| format!("schema_version 初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let config_repo = Arc::new(BudgetConfigRepository::new(conn.clone()));
        let audit_log_repo = Arc::new(AuditLogRepository::new(conn.clone()));
        let app_log_repo = Arc::new(AppLogRepository::new(conn.clone()));
        let budget_history_repo = Arc::new(BudgetHistoryRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let settings = config_manager.get_retention_settings().unwrap_or_else(|e| {
            tracing::warn!("读取数据保留配置失败, 使用默认值: {}", e);
            RetentionSettings::default()
        });

        // ==========================================
        // 初始化数据保留任务
        // ==========================================
        let routine = RetentionRoutine::new(audit_log_repo.clone())
            .with_category(
                CATEGORY_BUDGET_HISTORY,
                settings.budget_history_months,
                budget_history_repo.clone(),
            )
            .with_category(
                CATEGORY_AUDIT_LOG,
                settings.audit_log_months,
                audit_log_repo.clone(),
            )
            .with_category(CATEGORY_APP_LOG, settings.app_log_months, app_log_repo.clone());

        let retention_scheduler = Arc::new(RetentionScheduler::new(
            Arc::new(routine),
            primitive,
            &settings.timezone,
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let catalog_api = Arc::new(CatalogApi::new());
        let budget_config_api = Arc::new(BudgetConfigApi::new(
            config_repo,
            audit_log_repo.clone(),
        ));
        let budget_api = Arc::new(BudgetApi::new(
            budget_config_api.clone(),
            config_manager.clone(),
            budget_history_repo.clone(),
            app_log_repo.clone(),
        ));
        let retention_api = Arc::new(RetentionApi::new(
            retention_scheduler.clone(),
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            catalog_api,
            budget_config_api,
            budget_api,
            retention_api,
            config_manager,
            retention_scheduler,
            audit_log_repo,
            app_log_repo,
            budget_history_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 ARCFLOW_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("ARCFLOW_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./arcflow.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("arcflow");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("arcflow.db");
        }
    }

    path.to_string_lossy().to_string()
}
