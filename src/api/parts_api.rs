// ==========================================
// 汽车维修派工系统 - 配件管理 API
// ==========================================
// 职责: 配件登记、履约推进、子账查询
// 说明: 配件履约独立于工单生命周期,随时可查可推进
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::part::PartUsage;
use crate::domain::types::PartState;
use crate::engine::parts::{NewPartUsage, PartsTracker};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// 请求/响应结构
// ==========================================

/// 新配件登记参数
#[derive(Debug, Clone, Deserialize)]
pub struct NewPart {
    pub part_name: String,
    pub part_number: Option<String>,
    pub quantity: i32,
    pub unit_cost: Option<f64>,
    pub supplier: Option<String>,
    /// true: 已在库 (IN_STOCK); false: 需采购 (ORDERED)
    #[serde(default)]
    pub in_stock: bool,
    pub estimated_delivery: Option<NaiveDate>,
}

/// 配件信息 (对外视图,含进度百分比)
#[derive(Debug, Clone, Serialize)]
pub struct PartInfo {
    pub request_id: String,
    pub part_index: i32,
    pub part_name: String,
    pub part_number: Option<String>,
    pub quantity: i32,
    pub unit_cost: Option<f64>,
    pub supplier: Option<String>,
    pub fulfill_state: String,
    pub estimated_delivery: Option<NaiveDate>,
    /// 完成度百分比 (纯展示映射: ORDERED=25, SHIPPED=50, DELIVERED=75, INSTALLED/IN_STOCK=100)
    pub progress_percent: u8,
}

impl From<PartUsage> for PartInfo {
    fn from(p: PartUsage) -> Self {
        let progress_percent = p.progress_percent();
        Self {
            request_id: p.request_id,
            part_index: p.part_index,
            part_name: p.part_name,
            part_number: p.part_number,
            quantity: p.quantity,
            unit_cost: p.unit_cost,
            supplier: p.supplier,
            fulfill_state: p.fulfill_state.to_string(),
            estimated_delivery: p.estimated_delivery,
            progress_percent,
        }
    }
}

// ==========================================
// PartsApi - 配件管理 API
// ==========================================
pub struct PartsApi {
    tracker: Arc<PartsTracker>,
    config: Arc<ConfigManager>,
}

impl PartsApi {
    /// 创建新的PartsApi实例
    pub fn new(tracker: Arc<PartsTracker>, config: Arc<ConfigManager>) -> Self {
        Self { tracker, config }
    }

    /// 为请求登记配件
    pub fn add_part(
        &self,
        request_id: &str,
        new_part: NewPart,
        actor: Option<&str>,
    ) -> ApiResult<PartInfo> {
        if request_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("请求ID不能为空".to_string()));
        }

        let actor = self.resolve_actor(actor)?;
        let part = self.tracker.add_part(
            request_id,
            NewPartUsage {
                part_name: new_part.part_name,
                part_number: new_part.part_number,
                quantity: new_part.quantity,
                unit_cost: new_part.unit_cost,
                supplier: new_part.supplier,
                in_stock: new_part.in_stock,
                estimated_delivery: new_part.estimated_delivery,
            },
            &actor,
        )?;
        Ok(part.into())
    }

    /// 推进配件履约状态
    ///
    /// # 返回
    /// - Ok(PartInfo): 推进后的配件视图
    /// - Err(ApiError): NotFound / InvalidPartTransition
    pub fn advance_part(
        &self,
        request_id: &str,
        part_index: i32,
        new_state: PartState,
        actor: Option<&str>,
    ) -> ApiResult<PartInfo> {
        if request_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("请求ID不能为空".to_string()));
        }
        if part_index < 0 {
            return Err(ApiError::InvalidInput(format!(
                "配件序号不能为负,实际为 {}",
                part_index
            )));
        }

        let actor = self.resolve_actor(actor)?;
        let part = self
            .tracker
            .advance(request_id, part_index, new_state, &actor)?;
        Ok(part.into())
    }

    /// 查询请求的配件子账 (按登记顺序,含进度)
    pub fn list_parts(&self, request_id: &str) -> ApiResult<Vec<PartInfo>> {
        if request_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("请求ID不能为空".to_string()));
        }
        let parts = self.tracker.list_parts(request_id)?;
        Ok(parts.into_iter().map(PartInfo::from).collect())
    }

    /// 确定操作人 (缺省取配置 default_actor)
    fn resolve_actor(&self, actor: Option<&str>) -> ApiResult<String> {
        match actor {
            Some(a) if !a.trim().is_empty() => Ok(a.trim().to_string()),
            _ => Ok(self.config.get_default_actor()?),
        }
    }
}
