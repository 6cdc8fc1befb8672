// ==========================================
// 汽车维修派工系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: 状态机字段与技师负载只能经由本层提交修改
// ==========================================

pub mod dispatch;
pub mod parts;
pub mod queue;

// 重导出核心引擎
pub use dispatch::{DispatchEngine, DispatchError, DispatchResult};
pub use parts::{NewPartUsage, PartsError, PartsResult, PartsTracker};
pub use queue::RequestSorter;
