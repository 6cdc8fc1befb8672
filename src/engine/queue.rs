// ==========================================
// 汽车维修派工系统 - 待派请求排序引擎
// ==========================================
// 红线: 纯函数排序,每次调用基于当前数据重算,不缓存
// 说明: 排序结果只是给调度员的建议顺序,不触发自动派工
// ==========================================

use crate::domain::request::ServiceRequest;
use std::cmp::Ordering;

// ==========================================
// RequestSorter - 待派请求排序器
// ==========================================
pub struct RequestSorter {
    // 无状态引擎,不需要注入依赖
}

impl Default for RequestSorter {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSorter {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 排序请求列表
    ///
    /// 排序键:
    /// 1) priority 降序 (High > Medium > Low)
    /// 2) created_date 升序 (同优先级早创建者先)
    ///
    /// # 返回
    /// 排序后的请求列表（按派工建议顺序,优先者在前）
    pub fn sort(&self, mut requests: Vec<ServiceRequest>) -> Vec<ServiceRequest> {
        requests.sort_by(|a, b| self.compare(a, b));
        requests
    }

    /// 两条请求的派工优先比较
    fn compare(&self, a: &ServiceRequest, b: &ServiceRequest) -> Ordering {
        b.priority
            .ordinal()
            .cmp(&a.priority.ordinal())
            .then_with(|| a.created_date.cmp(&b.created_date))
            // 全同时按ID稳定,避免展示顺序抖动
            .then_with(|| a.request_id.cmp(&b.request_id))
    }
}
