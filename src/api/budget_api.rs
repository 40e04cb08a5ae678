// ==========================================
// ArcFlow - 预算计算 API
// ==========================================
// 职责: 读取租户配置与计价参数, 调用 BudgetCalculator
// 补充: “计算并记录”将结果写入预算版本历史
// 红线: 计算本身无副作用; 运行日志写入失败只告警
// ==========================================

use crate::api::budget_config_api::BudgetConfigApi;
use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::config::pricing_tables::PricingTables;
use crate::domain::app_log::{AppLogEntry, AppLogLevel};
use crate::domain::budget::{BudgetResult, ProjectParameters};
use crate::domain::budget_version::BudgetVersion;
use crate::engine::budget_calculator::BudgetCalculator;
use crate::repository::app_log_repo::AppLogRepository;
use crate::repository::budget_history_repo::BudgetHistoryRepository;
use std::sync::Arc;
use tracing::{info, instrument, warn};

const LOG_TARGET: &str = "budget_api";

pub struct BudgetApi {
    calculator: BudgetCalculator,
    config_api: Arc<BudgetConfigApi>,
    config_manager: Arc<ConfigManager>,
    history_repo: Arc<BudgetHistoryRepository>,
    app_log_repo: Arc<AppLogRepository>,
}

impl BudgetApi {
    pub fn new(
        config_api: Arc<BudgetConfigApi>,
        config_manager: Arc<ConfigManager>,
        history_repo: Arc<BudgetHistoryRepository>,
        app_log_repo: Arc<AppLogRepository>,
    ) -> Self {
        Self {
            calculator: BudgetCalculator::new(),
            config_api,
            config_manager,
            history_repo,
            app_log_repo,
        }
    }

    /// 当前计价参数
    pub fn pricing_tables(&self) -> ApiResult<PricingTables> {
        self.config_manager
            .get_pricing_tables()
            .map_err(|e| ApiError::InternalError(format!("读取计价参数失败: {}", e)))
    }

    /// 计算预算（不落库）
    ///
    /// 启用学科以 params.active_disciplines 为准, 租户配置提供学科覆写
    #[instrument(skip(self, params), fields(built_area = params.built_area))]
    pub fn calculate(&self, tenant_id: &str, params: &ProjectParameters) -> ApiResult<BudgetResult> {
        let view = self.config_api.get_configuration(tenant_id)?;
        let tables = self.pricing_tables()?;

        match self.calculator.calculate(params, &view.configuration, &tables) {
            Ok(result) => {
                self.append_log(
                    AppLogLevel::Info,
                    tenant_id,
                    format!(
                        "预算计算成功: total={:.2}, disciplines={}, days={}",
                        result.total_value,
                        result.discipline_values.len(),
                        result.total_duration_days
                    ),
                );
                Ok(result)
            }
            Err(e) => {
                self.append_log(AppLogLevel::Warn, tenant_id, format!("预算计算被拒绝: {}", e));
                Err(e.into())
            }
        }
    }

    /// 计算并记录为新版本
    #[instrument(skip(self, params))]
    pub fn calculate_and_record(
        &self,
        tenant_id: &str,
        budget_id: &str,
        actor: &str,
        params: &ProjectParameters,
    ) -> ApiResult<BudgetVersion> {
        if budget_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("预算ID不能为空".to_string()));
        }

        let result = self.calculate(tenant_id, params)?;
        let draft = BudgetVersion::draft(tenant_id.trim(), budget_id.trim(), params.clone(), result, actor);
        let stored = self.history_repo.insert_next_version(&draft)?;

        info!(
            "预算版本已记录: budget_id={}, version_no={}",
            stored.budget_id, stored.version_no
        );
        Ok(stored)
    }

    /// 预算版本列表（新版本在前）
    pub fn list_versions(&self, tenant_id: &str, budget_id: &str) -> ApiResult<Vec<BudgetVersion>> {
        Ok(self.history_repo.list_by_budget(tenant_id.trim(), budget_id.trim())?)
    }

    fn append_log(&self, level: AppLogLevel, tenant_id: &str, message: String) {
        let entry = AppLogEntry::new(level, LOG_TARGET, Some(tenant_id.trim()), message);
        if let Err(e) = self.app_log_repo.append(&entry) {
            warn!("运行日志写入失败(忽略): {}", e);
        }
    }
}
