// ==========================================
// 汽车维修派工系统 - 领域类型定义
// ==========================================
// 红线: 状态只能由引擎写入,类型层只提供合法性判断
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 请求优先级 (Priority)
// ==========================================
// 等级制: High(3) > Medium(2) > Low(1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,    // 低
    Medium, // 中
    High,   // 高
}

impl Priority {
    /// 优先级序数 (用于排序与展示)
    pub fn ordinal(&self) -> i32 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    /// 数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "HIGH" => Some(Priority::High),
            "MEDIUM" => Some(Priority::Medium),
            "LOW" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 请求状态 (Request State)
// ==========================================
// 状态机: PENDING -> ASSIGNED -> COMPLETED
// 红线: 只能前进,COMPLETED 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    Pending,   // 待派工
    Assigned,  // 已派工 (工作进行中)
    Completed, // 已完工
}

impl RequestState {
    /// 数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RequestState::Pending => "PENDING",
            RequestState::Assigned => "ASSIGNED",
            RequestState::Completed => "COMPLETED",
        }
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(RequestState::Pending),
            "ASSIGNED" => Some(RequestState::Assigned),
            "COMPLETED" => Some(RequestState::Completed),
            _ => None,
        }
    }

    /// 状态机序数 (用于前进性校验)
    pub fn rank(&self) -> i32 {
        match self {
            RequestState::Pending => 0,
            RequestState::Assigned => 1,
            RequestState::Completed => 2,
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Completed)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 配件履约状态 (Part Fulfillment State)
// ==========================================
// 履约链: ORDERED -> SHIPPED -> DELIVERED -> INSTALLED
// IN_STOCK 为"已在库"终态捷径,等价于预履约完成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartState {
    InStock,   // 已在库
    Ordered,   // 已下单
    Shipped,   // 已发货
    Delivered, // 已到货
    Installed, // 已安装
}

impl PartState {
    /// 数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PartState::InStock => "IN_STOCK",
            PartState::Ordered => "ORDERED",
            PartState::Shipped => "SHIPPED",
            PartState::Delivered => "DELIVERED",
            PartState::Installed => "INSTALLED",
        }
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "IN_STOCK" => Some(PartState::InStock),
            "ORDERED" => Some(PartState::Ordered),
            "SHIPPED" => Some(PartState::Shipped),
            "DELIVERED" => Some(PartState::Delivered),
            "INSTALLED" => Some(PartState::Installed),
            _ => None,
        }
    }

    /// 履约链序数 (IN_STOCK 不参与履约链)
    fn chain_rank(&self) -> Option<i32> {
        match self {
            PartState::InStock => None,
            PartState::Ordered => Some(1),
            PartState::Shipped => Some(2),
            PartState::Delivered => Some(3),
            PartState::Installed => Some(4),
        }
    }

    /// 是否为终态 (不再允许推进)
    pub fn is_terminal(&self) -> bool {
        matches!(self, PartState::InStock | PartState::Installed)
    }

    /// 履约状态是否允许推进到 `new_state`
    ///
    /// 规则:
    /// - 只允许沿 ORDERED -> SHIPPED -> DELIVERED -> INSTALLED 向前
    /// - 允许跨步前进 (现场状态上报可能滞后)
    /// - 禁止回退、禁止原地踏步
    /// - IN_STOCK 为终态,不参与推进
    pub fn can_advance_to(&self, new_state: PartState) -> bool {
        match (self.chain_rank(), new_state.chain_rank()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }

    /// 完成度百分比 (纯展示映射,不参与状态机)
    pub fn progress_percent(&self) -> u8 {
        match self {
            PartState::InStock => 100,
            PartState::Ordered => 25,
            PartState::Shipped => 50,
            PartState::Delivered => 75,
            PartState::Installed => 100,
        }
    }
}

impl fmt::Display for PartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 技师状态 (Mechanic Status)
// ==========================================
// 红线: 派生状态,永不落库 —— 始终由负载重新计算,防止漂移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MechanicStatus {
    Available, // 可接单
    Busy,      // 已满载
}

impl fmt::Display for MechanicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MechanicStatus::Available => write!(f, "AVAILABLE"),
            MechanicStatus::Busy => write!(f, "BUSY"),
        }
    }
}
