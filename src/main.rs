// ==========================================
// 汽车维修派工系统 - 主入口
// ==========================================
// 说明: 核心以库形式提供;本入口只负责初始化并自检
// ==========================================

use auto_repair_dispatch::app::{get_default_db_path, AppState};
use auto_repair_dispatch::logging;

fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", auto_repair_dispatch::APP_NAME);
    tracing::info!("系统版本: {}", auto_repair_dispatch::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("无法初始化AppState: {}", e);
            std::process::exit(1);
        }
    };

    // 启动自检: 汇总当前派工状况
    match app_state.request_api.summary() {
        Ok(summary) => {
            tracing::info!(
                pending = summary.pending_count,
                assigned = summary.assigned_count,
                completed = summary.completed_count,
                available_mechanics = summary.available_mechanics,
                "派工核心就绪"
            );
        }
        Err(e) => {
            tracing::error!("汇总查询失败: {}", e);
            std::process::exit(1);
        }
    }
}
