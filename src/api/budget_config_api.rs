// ==========================================
// ArcFlow - 预算配置 API
// ==========================================
// 职责: 租户学科配置的读取、保存、删除
// 红线: 读取永不返回“未找到”, 无配置时返回默认配置并标记 was_defaulted
// 红线: 保存前完成全部规则校验, 违规时不落库
// 红线: 写入成功后记录审计 (审计失败只告警, 不回滚业务写入)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::audit_log::{AuditAction, AuditEntry};
use crate::domain::discipline::{BudgetConfiguration, ConfigurationView, DisciplineConfig};
use crate::engine::discipline_rules;
use crate::repository::audit_log_repo::AuditLogRepository;
use crate::repository::budget_config_repo::BudgetConfigRepository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 审计类别
pub const AUDIT_CATEGORY_CONFIGURATION: &str = "budget_configuration";

// ==========================================
// 请求载荷
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveConfigurationRequest {
    pub active_disciplines: Vec<String>,
    #[serde(default)]
    pub configs_by_discipline: BTreeMap<String, DisciplineConfig>,
}

// ==========================================
// BudgetConfigApi
// ==========================================
pub struct BudgetConfigApi {
    config_repo: Arc<BudgetConfigRepository>,
    audit_repo: Arc<AuditLogRepository>,
}

impl BudgetConfigApi {
    pub fn new(config_repo: Arc<BudgetConfigRepository>, audit_repo: Arc<AuditLogRepository>) -> Self {
        Self {
            config_repo,
            audit_repo,
        }
    }

    /// 读取租户配置
    ///
    /// # 返回
    /// - 已保存配置 (was_defaulted=false)
    /// - 或默认配置 {ARQUITETURA} (was_defaulted=true)
    pub fn get_configuration(&self, tenant_id: &str) -> ApiResult<ConfigurationView> {
        let tenant_id = require_tenant(tenant_id)?;

        match self.config_repo.find_by_tenant(tenant_id)? {
            Some(configuration) => Ok(ConfigurationView {
                configuration,
                was_defaulted: false,
            }),
            None => Ok(ConfigurationView {
                configuration: BudgetConfiguration::default_for(tenant_id),
                was_defaulted: true,
            }),
        }
    }

    /// 保存租户配置（整体替换）
    ///
    /// # 错误
    /// - `ConfigurationValidation`: 未知学科 / 缺少必选 / 依赖缺失 / 互斥 / 覆写值非法
    #[instrument(skip(self, request))]
    pub fn save_configuration(
        &self,
        tenant_id: &str,
        actor: &str,
        request: SaveConfigurationRequest,
    ) -> ApiResult<BudgetConfiguration> {
        let tenant_id = require_tenant(tenant_id)?;

        // 1. 解析原始代码
        let (active, mut violations) =
            discipline_rules::parse_codes(&request.active_disciplines, "activeDisciplines");
        let (configs, key_violations) =
            discipline_rules::parse_config_keys(&request.configs_by_discipline, "configsByDiscipline");
        violations.extend(key_violations);

        // 2. 规则校验
        violations.extend(discipline_rules::validate_configuration(&active, &configs));
        if !violations.is_empty() {
            warn!("预算配置校验失败: {}项违规", violations.len());
            return Err(ApiError::configuration_validation(violations));
        }

        // 3. 落库
        let before = self.config_repo.find_by_tenant(tenant_id)?;
        let configuration = BudgetConfiguration {
            tenant_id: tenant_id.to_string(),
            active_disciplines: active,
            configs_by_discipline: configs,
            updated_at: chrono::Utc::now().naive_utc(),
        };
        self.config_repo.upsert(&configuration)?;

        info!(
            "预算配置已保存: {}个启用学科, {}项覆写",
            configuration.active_disciplines.len(),
            configuration.configs_by_discipline.len()
        );

        // 4. 审计
        self.record_audit(
            AuditAction::ConfigurationSave,
            actor,
            before.as_ref(),
            Some(&configuration),
            format!("保存租户 {} 的预算配置", tenant_id),
        );

        Ok(configuration)
    }

    /// 删除租户配置（幂等）
    ///
    /// # 返回
    /// - `Ok(true)`: 删除了已有配置
    /// - `Ok(false)`: 本无配置
    #[instrument(skip(self))]
    pub fn delete_configuration(&self, tenant_id: &str, actor: &str) -> ApiResult<bool> {
        let tenant_id = require_tenant(tenant_id)?;

        let before = self.config_repo.find_by_tenant(tenant_id)?;
        let removed = self.config_repo.delete(tenant_id)?;

        if removed {
            info!("预算配置已删除");
            self.record_audit(
                AuditAction::ConfigurationDelete,
                actor,
                before.as_ref(),
                None,
                format!("删除租户 {} 的预算配置", tenant_id),
            );
        }

        Ok(removed)
    }

    fn record_audit(
        &self,
        action: AuditAction,
        actor: &str,
        before: Option<&BudgetConfiguration>,
        after: Option<&BudgetConfiguration>,
        description: String,
    ) {
        let entry = AuditEntry::new(AUDIT_CATEGORY_CONFIGURATION, action.as_str(), actor, description)
            .with_before(before.and_then(|c| serde_json::to_value(c).ok()))
            .with_after(after.and_then(|c| serde_json::to_value(c).ok()));

        if let Err(e) = self.audit_repo.insert(&entry) {
            warn!("预算配置审计写入失败(忽略): {}", e);
        }
    }
}

fn require_tenant(tenant_id: &str) -> ApiResult<&str> {
    let trimmed = tenant_id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("租户ID不能为空".to_string()));
    }
    Ok(trimmed)
}
