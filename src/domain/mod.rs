// ==========================================
// 汽车维修派工系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod audit;
pub mod mechanic;
pub mod part;
pub mod request;
pub mod types;

// 重导出核心类型
pub use audit::{ActionType, AuditEntry};
pub use mechanic::{CapacityCheck, Mechanic};
pub use part::PartUsage;
pub use request::ServiceRequest;
pub use types::{MechanicStatus, PartState, Priority, RequestState};
