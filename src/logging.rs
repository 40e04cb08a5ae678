// ==========================================
// ArcFlow - 日志系统
// ==========================================
// 输出: tracing-subscriber fmt, 文本或 JSON 行 (ARCFLOW_LOG_FORMAT=json)
// 过滤: RUST_LOG 优先, 未设置时使用 DEFAULT_LOG_FILTER
// ==========================================
// 常用 target:
// - arcflow_core::engine::scheduler      调度状态迁移 / 丢弃的触发
// - arcflow_core::engine::cron_trigger   装配与每次触发
// - arcflow_core::engine::retention      每类清理条数与失败原因
// - arcflow_core::engine::budget_calculator  计算明细 (debug)
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤: 全局 info, 调度器状态迁移保留 debug
pub const DEFAULT_LOG_FILTER: &str = "info,arcflow_core::engine::scheduler=debug";

/// 输出格式环境变量
pub const LOG_FORMAT_ENV: &str = "ARCFLOW_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// 未知取值按文本处理
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or(LogFormat::Text)
    }
}

/// 构造过滤器: 非空的 RUST_LOG 覆盖默认值
fn build_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 例如 `RUST_LOG=arcflow_core::engine::retention=debug`
/// - ARCFLOW_LOG_FORMAT: `json` 输出 JSON 行, 便于宿主采集
///
/// 重复初始化（宿主已安装 subscriber）时静默忽略
///
/// # 示例
/// ```no_run
/// arcflow_core::logging::init();
/// tracing::info!(target: "arcflow_core::engine::scheduler", "ready");
/// ```
pub fn init() {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(rust_log.as_deref());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    let _ = match LogFormat::from_env() {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

/// 测试用: debug 级别, 输出到测试捕获
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" json "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }

    #[test]
    fn test_filter_falls_back_to_default() {
        assert_eq!(build_filter(None).to_string(), EnvFilter::new(DEFAULT_LOG_FILTER).to_string());
        assert_eq!(build_filter(Some("  ")).to_string(), EnvFilter::new(DEFAULT_LOG_FILTER).to_string());
        let custom = build_filter(Some("arcflow_core::engine::retention=trace")).to_string();
        assert!(custom.contains("arcflow_core::engine::retention"));
        assert!(!custom.contains("scheduler"));
    }
}
