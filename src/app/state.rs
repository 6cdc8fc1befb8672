// ==========================================
// 汽车维修派工系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{DispatchApi, MechanicApi, PartsApi, RequestApi};
use crate::config::ConfigManager;
use crate::engine::{DispatchEngine, PartsTracker};
use crate::repository::{
    AuditLogRepository, DispatchRepository, MechanicRepository, PartUsageRepository,
    ServiceRequestRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源,作为全局状态管理
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 技师管理API
    pub mechanic_api: Arc<MechanicApi>,

    /// 服务请求API
    pub request_api: Arc<RequestApi>,

    /// 派工API
    pub dispatch_api: Arc<DispatchApi>,

    /// 配件管理API
    pub parts_api: Arc<PartsApi>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开数据库连接并初始化 schema
    /// 2. 初始化所有Repository
    /// 3. 初始化所有Engine
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState,数据库路径: {}", db_path);

        // 创建数据库连接 (共享连接,单写者串行化)
        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("无法初始化schema: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let mechanic_repo = Arc::new(MechanicRepository::from_connection(conn.clone()));
        let request_repo = Arc::new(ServiceRequestRepository::from_connection(conn.clone()));
        let part_repo = Arc::new(PartUsageRepository::from_connection(conn.clone()));
        let audit_log_repo = Arc::new(AuditLogRepository::from_connection(conn.clone()));
        let dispatch_repo = Arc::new(DispatchRepository::from_connection(conn.clone()));

        // ==========================================
        // 初始化配置层
        // ==========================================
        let config = Arc::new(ConfigManager::from_connection(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let dispatch_engine = Arc::new(DispatchEngine::new(
            request_repo.clone(),
            mechanic_repo.clone(),
            dispatch_repo,
        ));
        let parts_tracker = Arc::new(PartsTracker::new(request_repo.clone(), part_repo.clone()));

        // ==========================================
        // 创建API实例
        // ==========================================
        let mechanic_api = Arc::new(MechanicApi::new(mechanic_repo.clone(), config.clone()));
        let request_api = Arc::new(RequestApi::new(
            request_repo,
            part_repo,
            audit_log_repo,
            mechanic_repo,
            config.clone(),
        ));
        let dispatch_api = Arc::new(DispatchApi::new(dispatch_engine, config.clone()));
        let parts_api = Arc::new(PartsApi::new(parts_tracker, config.clone()));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            mechanic_api,
            request_api,
            dispatch_api,
            parts_api,
            config,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用系统数据目录,不可用时回退当前目录
pub fn get_default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let app_dir = base.join("auto-repair-dispatch");
    if let Err(e) = std::fs::create_dir_all(&app_dir) {
        tracing::warn!("无法创建数据目录 {:?},回退当前目录: {}", app_dir, e);
        return "dispatch.db".to_string();
    }
    app_dir.join("dispatch.db").to_string_lossy().to_string()
}
