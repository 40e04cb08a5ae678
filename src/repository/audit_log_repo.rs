// ==========================================
// ArcFlow - 审计日志数据仓储
// ==========================================
// 对齐: audit_log 表
// 红线: 配置写入与保留任务执行必须记录
// ==========================================

mod core;
mod queries;
mod sink;

#[cfg(test)]
mod tests;

pub use self::core::AuditLogRepository;
