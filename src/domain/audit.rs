// ==========================================
// 汽车维修派工系统 - 操作日志领域模型
// ==========================================
// 红线: 所有改变状态的写入必须记录
// 用途: 审计追踪,每条请求的完整历史
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// ActionType - 操作类型
// ==========================================
// label() 为对外展示/落库的动作标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    OrderCreated,   // 创建工单
    OrderAssigned,  // 派工
    WorkCompleted,  // 完工
    PartsOrdered,   // 配件下单
    PartsInStock,   // 配件在库登记
    PartsShipped,   // 配件发货
    PartsDelivered, // 配件到货
    PartsInstalled, // 配件安装
}

impl ActionType {
    /// 动作标签 (落库与展示共用同一字符串)
    pub fn label(&self) -> &'static str {
        match self {
            ActionType::OrderCreated => "Order Created",
            ActionType::OrderAssigned => "Order Assigned",
            ActionType::WorkCompleted => "Work Completed",
            ActionType::PartsOrdered => "Parts Ordered",
            ActionType::PartsInStock => "Parts In Stock",
            ActionType::PartsShipped => "Parts Shipped",
            ActionType::PartsDelivered => "Parts Delivered",
            ActionType::PartsInstalled => "Parts Installed",
        }
    }
}

// ==========================================
// AuditEntry - 操作日志条目
// ==========================================
// 红线: 追加后不可变更,插入顺序 == 时间顺序
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub entry_id: String,          // 日志ID
    pub request_id: String,        // 关联请求ID
    pub action: String,            // 动作标签 (存储为字符串)
    pub detail: Option<String>,    // 详细描述
    pub actor: String,             // 操作人
    pub entry_ts: NaiveDateTime,   // 操作时间戳
}

impl AuditEntry {
    /// 创建新的日志条目 (时间戳取当前时刻)
    pub fn new(
        request_id: &str,
        action: ActionType,
        detail: Option<String>,
        actor: &str,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            request_id: request_id.to_string(),
            action: action.label().to_string(),
            detail,
            actor: actor.to_string(),
            entry_ts: Utc::now().naive_utc(),
        }
    }
}
