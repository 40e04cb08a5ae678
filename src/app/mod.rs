// ==========================================
// ArcFlow - 应用层
// ==========================================
// 职责: 装配各层, 供宿主进程使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
