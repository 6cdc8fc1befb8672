// ==========================================
// 汽车维修派工系统 - 服务请求领域模型
// ==========================================
// 红线: status / 派工字段 / 完工字段 只能由派工引擎提交修改
// 状态机: PENDING -> ASSIGNED -> COMPLETED (只前进,COMPLETED 终态)
// ==========================================

use crate::domain::types::{Priority, RequestState};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ServiceRequest - 服务请求/工单
// ==========================================
// 不变式:
// - 同一时刻至多一个在修技师 (assigned_mechanic_id)
// - ASSIGNED 态必有 assigned_mechanic_id + assigned_at
// - COMPLETED 态必有 completed_at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    // ===== 主键与客户信息 =====
    pub request_id: String,            // 请求ID
    pub customer_name: String,         // 客户姓名
    pub customer_contact: Option<String>, // 联系方式 (电话/邮箱)
    pub vehicle_info: String,          // 车辆描述
    pub issue: String,                 // 故障描述

    // ===== 派工排序键 =====
    pub priority: Priority,            // 优先级
    pub created_date: NaiveDate,       // 创建日期 (同优先级的平局键,早者先)

    // ===== 状态机 =====
    pub status: RequestState,          // 当前状态

    // ===== 派工数据 (ASSIGNED 后才有) =====
    pub assigned_mechanic_id: Option<String>, // 在修技师ID
    pub assigned_at: Option<NaiveDateTime>,   // 派工时间

    // ===== 完工数据 (COMPLETED 后才有) =====
    pub completed_at: Option<NaiveDateTime>,  // 完工时间
    pub actual_cost: Option<f64>,             // 实际费用
    pub service_rating: Option<f64>,          // 客户评分
}

impl ServiceRequest {
    /// 是否待派工
    pub fn is_pending(&self) -> bool {
        self.status == RequestState::Pending
    }

    /// 是否已完工 (终态)
    pub fn is_completed(&self) -> bool {
        self.status == RequestState::Completed
    }
}
