// ==========================================
// 汽车维修派工系统 - 派工 API
// ==========================================
// 职责: 派工/完工命令入口,参数校验后委托派工引擎
// 说明: 引擎不自动撮合 —— (请求,技师) 配对由调度员选定,
//       引擎只在提交时校验配对合法性
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::request_api::RequestSummary;
use crate::config::ConfigManager;
use crate::engine::dispatch::DispatchEngine;
use std::sync::Arc;

// ==========================================
// DispatchApi - 派工 API
// ==========================================
pub struct DispatchApi {
    engine: Arc<DispatchEngine>,
    config: Arc<ConfigManager>,
}

impl DispatchApi {
    /// 创建新的DispatchApi实例
    pub fn new(engine: Arc<DispatchEngine>, config: Arc<ConfigManager>) -> Self {
        Self { engine, config }
    }

    /// 派工
    ///
    /// # 参数
    /// - request_id: 请求ID
    /// - mechanic_id: 技师ID
    /// - actor: 操作人 (缺省取配置 default_actor)
    ///
    /// # 返回
    /// - Ok(RequestSummary): 更新后的请求摘要
    /// - Err(ApiError): NotFound / InvalidStateTransition / CapacityExceeded
    pub fn assign(
        &self,
        request_id: &str,
        mechanic_id: &str,
        actor: Option<&str>,
    ) -> ApiResult<RequestSummary> {
        if request_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("请求ID不能为空".to_string()));
        }
        if mechanic_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("技师ID不能为空".to_string()));
        }

        let actor = self.resolve_actor(actor)?;
        let request = self.engine.assign(request_id, mechanic_id, &actor)?;
        Ok(request.into())
    }

    /// 完工
    ///
    /// # 参数
    /// - request_id: 请求ID
    /// - actual_cost: 实际费用 (可选)
    /// - service_rating: 客户评分 (可选, [0,5])
    /// - actor: 操作人 (缺省取配置 default_actor)
    pub fn complete(
        &self,
        request_id: &str,
        actual_cost: Option<f64>,
        service_rating: Option<f64>,
        actor: Option<&str>,
    ) -> ApiResult<RequestSummary> {
        if request_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("请求ID不能为空".to_string()));
        }
        if let Some(rating) = service_rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(ApiError::ValidationError(format!(
                    "评分必须在 [0,5] 区间,实际为 {}",
                    rating
                )));
            }
        }
        if let Some(cost) = actual_cost {
            if cost < 0.0 {
                return Err(ApiError::ValidationError("实际费用不能为负".to_string()));
            }
        }

        let actor = self.resolve_actor(actor)?;
        let request = self
            .engine
            .complete(request_id, &actor, actual_cost, service_rating)?;
        Ok(request.into())
    }

    /// 确定操作人 (缺省取配置 default_actor)
    fn resolve_actor(&self, actor: Option<&str>) -> ApiResult<String> {
        match actor {
            Some(a) if !a.trim().is_empty() => Ok(a.trim().to_string()),
            _ => Ok(self.config.get_default_actor()?),
        }
    }
}
