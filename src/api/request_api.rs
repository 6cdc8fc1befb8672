// ==========================================
// 汽车维修派工系统 - 服务请求 API
// ==========================================
// 职责: 工单创建、待派队列查询、详情与审计追踪、汇总统计
// 说明: 待派队列每次调用基于当前数据重算排序,不缓存
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::parts_api::PartInfo;
use crate::config::ConfigManager;
use crate::domain::audit::{ActionType, AuditEntry};
use crate::domain::request::ServiceRequest;
use crate::domain::types::{Priority, RequestState};
use crate::engine::queue::RequestSorter;
use crate::repository::audit_log_repo::AuditLogRepository;
use crate::repository::mechanic_repo::MechanicRepository;
use crate::repository::part_repo::PartUsageRepository;
use crate::repository::request_repo::ServiceRequestRepository;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// 请求/响应结构
// ==========================================

/// 新建服务请求参数
#[derive(Debug, Clone, Deserialize)]
pub struct NewServiceRequest {
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub vehicle_info: String,
    pub issue: String,
    pub priority: Priority,
    /// 缺省取当天 (测试夹具可指定固定日期)
    pub created_date: Option<NaiveDate>,
}

/// 请求摘要 (列表视图)
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    pub request_id: String,
    pub customer_name: String,
    pub vehicle_info: String,
    pub issue: String,
    pub priority: String,
    pub status: String,
    pub created_date: NaiveDate,
    pub assigned_mechanic_id: Option<String>,
}

impl From<ServiceRequest> for RequestSummary {
    fn from(r: ServiceRequest) -> Self {
        Self {
            request_id: r.request_id,
            customer_name: r.customer_name,
            vehicle_info: r.vehicle_info,
            issue: r.issue,
            priority: r.priority.to_string(),
            status: r.status.to_string(),
            created_date: r.created_date,
            assigned_mechanic_id: r.assigned_mechanic_id,
        }
    }
}

/// 日志条目视图
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntryInfo {
    pub action: String,
    pub detail: Option<String>,
    pub actor: String,
    pub entry_ts: NaiveDateTime,
}

impl From<AuditEntry> for AuditEntryInfo {
    fn from(e: AuditEntry) -> Self {
        Self {
            action: e.action,
            detail: e.detail,
            actor: e.actor,
            entry_ts: e.entry_ts,
        }
    }
}

/// 请求详情 (含配件子账与完整历史)
#[derive(Debug, Clone, Serialize)]
pub struct RequestDetail {
    pub request_id: String,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub vehicle_info: String,
    pub issue: String,
    pub priority: String,
    pub status: String,
    pub created_date: NaiveDate,
    pub assigned_mechanic_id: Option<String>,
    pub assigned_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub actual_cost: Option<f64>,
    pub service_rating: Option<f64>,
    pub required_parts: Vec<PartInfo>,
    pub status_history: Vec<AuditEntryInfo>,
}

/// 驾驶舱汇总
#[derive(Debug, Clone, Serialize)]
pub struct DispatchSummary {
    pub pending_count: i64,
    pub assigned_count: i64,
    pub completed_count: i64,
    pub available_mechanics: i64,
}

// ==========================================
// RequestApi - 服务请求 API
// ==========================================
pub struct RequestApi {
    request_repo: Arc<ServiceRequestRepository>,
    part_repo: Arc<PartUsageRepository>,
    audit_log_repo: Arc<AuditLogRepository>,
    mechanic_repo: Arc<MechanicRepository>,
    sorter: RequestSorter,
    config: Arc<ConfigManager>,
}

impl RequestApi {
    /// 创建新的RequestApi实例
    pub fn new(
        request_repo: Arc<ServiceRequestRepository>,
        part_repo: Arc<PartUsageRepository>,
        audit_log_repo: Arc<AuditLogRepository>,
        mechanic_repo: Arc<MechanicRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            request_repo,
            part_repo,
            audit_log_repo,
            mechanic_repo,
            sorter: RequestSorter::new(),
            config,
        }
    }

    /// 创建服务请求
    ///
    /// 校验: 客户/车辆/故障描述非空
    /// 新请求固定进入 PENDING,同事务追加日志 "Order Created"
    ///
    /// # 返回
    /// - Ok(request_id): 新请求ID
    pub fn create_request(
        &self,
        new_request: NewServiceRequest,
        actor: Option<&str>,
    ) -> ApiResult<String> {
        if new_request.customer_name.trim().is_empty() {
            return Err(ApiError::ValidationError("客户姓名不能为空".to_string()));
        }
        if new_request.vehicle_info.trim().is_empty() {
            return Err(ApiError::ValidationError("车辆描述不能为空".to_string()));
        }
        if new_request.issue.trim().is_empty() {
            return Err(ApiError::ValidationError("故障描述不能为空".to_string()));
        }

        let actor = self.resolve_actor(actor)?;
        let request = ServiceRequest {
            request_id: Uuid::new_v4().to_string(),
            customer_name: new_request.customer_name.trim().to_string(),
            customer_contact: new_request.customer_contact,
            vehicle_info: new_request.vehicle_info.trim().to_string(),
            issue: new_request.issue.trim().to_string(),
            priority: new_request.priority,
            created_date: new_request
                .created_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            status: RequestState::Pending,
            assigned_mechanic_id: None,
            assigned_at: None,
            completed_at: None,
            actual_cost: None,
            service_rating: None,
        };

        let entry = AuditEntry::new(
            &request.request_id,
            ActionType::OrderCreated,
            Some(format!("{} - {}", request.vehicle_info, request.issue)),
            &actor,
        );
        self.request_repo.insert_with_log(&request, &entry)?;

        tracing::info!(
            request_id = %request.request_id,
            priority = %request.priority,
            "创建服务请求"
        );
        Ok(request.request_id)
    }

    /// 查询待派队列 (排序后)
    ///
    /// 排序: priority 降序,同级按 created_date 升序 —— 调度员参考顺序
    pub fn list_pending(&self) -> ApiResult<Vec<RequestSummary>> {
        let pending = self.request_repo.find_by_status(RequestState::Pending)?;
        let sorted = self.sorter.sort(pending);
        Ok(sorted.into_iter().map(RequestSummary::from).collect())
    }

    /// 查询全部请求
    pub fn list_all(&self) -> ApiResult<Vec<RequestSummary>> {
        let requests = self.request_repo.list_all()?;
        Ok(requests.into_iter().map(RequestSummary::from).collect())
    }

    /// 查询请求详情 (含配件子账与完整历史)
    pub fn get_detail(&self, request_id: &str) -> ApiResult<RequestDetail> {
        if request_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("请求ID不能为空".to_string()));
        }
        let request = self
            .request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| ApiError::NotFound(format!("服务请求(id={})不存在", request_id)))?;

        let parts = self.part_repo.find_by_request(request_id)?;
        let history = self.audit_log_repo.list_by_request(request_id)?;

        Ok(RequestDetail {
            request_id: request.request_id,
            customer_name: request.customer_name,
            customer_contact: request.customer_contact,
            vehicle_info: request.vehicle_info,
            issue: request.issue,
            priority: request.priority.to_string(),
            status: request.status.to_string(),
            created_date: request.created_date,
            assigned_mechanic_id: request.assigned_mechanic_id,
            assigned_at: request.assigned_at,
            completed_at: request.completed_at,
            actual_cost: request.actual_cost,
            service_rating: request.service_rating,
            required_parts: parts.into_iter().map(PartInfo::from).collect(),
            status_history: history.into_iter().map(AuditEntryInfo::from).collect(),
        })
    }

    /// 查询请求的审计追踪 (最早在前)
    pub fn audit_trail(&self, request_id: &str) -> ApiResult<Vec<AuditEntryInfo>> {
        if request_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("请求ID不能为空".to_string()));
        }
        self.request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| ApiError::NotFound(format!("服务请求(id={})不存在", request_id)))?;

        let entries = self.audit_log_repo.list_by_request(request_id)?;
        Ok(entries.into_iter().map(AuditEntryInfo::from).collect())
    }

    /// 驾驶舱汇总统计
    pub fn summary(&self) -> ApiResult<DispatchSummary> {
        Ok(DispatchSummary {
            pending_count: self.request_repo.count_by_status(RequestState::Pending)?,
            assigned_count: self.request_repo.count_by_status(RequestState::Assigned)?,
            completed_count: self.request_repo.count_by_status(RequestState::Completed)?,
            available_mechanics: self.mechanic_repo.find_available()?.len() as i64,
        })
    }

    /// 确定操作人 (缺省取配置 default_actor)
    fn resolve_actor(&self, actor: Option<&str>) -> ApiResult<String> {
        match actor {
            Some(a) if !a.trim().is_empty() => Ok(a.trim().to_string()),
            _ => Ok(self.config.get_default_actor()?),
        }
    }
}
