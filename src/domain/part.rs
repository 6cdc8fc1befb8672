// ==========================================
// 汽车维修派工系统 - 配件使用领域模型
// ==========================================
// 红线: fulfill_state 只能由配件追踪引擎提交修改
// 履约链: ORDERED -> SHIPPED -> DELIVERED -> INSTALLED (单调不回退)
// ==========================================

use crate::domain::types::PartState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// PartUsage - 配件使用条目
// ==========================================
// 每条属于一个服务请求,按 part_index 保序
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartUsage {
    // ===== 主键 =====
    pub request_id: String,        // 所属请求ID
    pub part_index: i32,           // 请求内序号 (0起,追加保序)

    // ===== 配件信息 =====
    pub part_name: String,         // 配件名称
    pub part_number: Option<String>, // 配件编号
    pub quantity: i32,             // 数量 (>= 1)
    pub unit_cost: Option<f64>,    // 单价
    pub supplier: Option<String>,  // 供应商

    // ===== 履约 =====
    pub fulfill_state: PartState,  // 履约状态
    pub estimated_delivery: Option<NaiveDate>, // 预计到货日期
}

impl PartUsage {
    /// 完成度百分比 (纯展示映射)
    pub fn progress_percent(&self) -> u8 {
        self.fulfill_state.progress_percent()
    }
}
