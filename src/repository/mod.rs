// ==========================================
// 汽车维修派工系统 - 数据仓储层
// ==========================================
// 职责: SQLite 数据映射
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod audit_log_repo;
pub(crate) mod convert;
pub mod dispatch_repo;
pub mod error;
pub mod mechanic_repo;
pub mod part_repo;
pub mod request_repo;

// 重导出核心类型
pub use audit_log_repo::AuditLogRepository;
pub use dispatch_repo::DispatchRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use mechanic_repo::MechanicRepository;
pub use part_repo::PartUsageRepository;
pub use request_repo::ServiceRequestRepository;
