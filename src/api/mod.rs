// ==========================================
// 汽车维修派工系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供上层 (UI/服务壳) 调用
// ==========================================

pub mod dispatch_api;
pub mod error;
pub mod mechanic_api;
pub mod parts_api;
pub mod request_api;

// 重导出核心类型
pub use dispatch_api::DispatchApi;
pub use error::{ApiError, ApiResult};
pub use mechanic_api::{MechanicApi, MechanicInfo, NewMechanic};
pub use parts_api::{NewPart, PartInfo, PartsApi};
pub use request_api::{
    AuditEntryInfo, DispatchSummary, NewServiceRequest, RequestApi, RequestDetail, RequestSummary,
};
