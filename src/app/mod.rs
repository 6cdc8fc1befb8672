// ==========================================
// 汽车维修派工系统 - 应用层
// ==========================================
// 职责: 装配共享状态,连接外壳与核心
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
