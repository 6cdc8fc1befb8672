// ==========================================
// 汽车维修派工系统 - 派工引擎 (状态机)
// ==========================================
// 状态机: PENDING -> ASSIGNED -> COMPLETED
// 红线: 本引擎是 status / 派工字段 / 完工字段 / current_load 的唯一写入者
// 红线: Engine 不拼 SQL —— 校验与决策在内存完成,
//       算好的新行交给 DispatchRepository 一次性事务提交
// 说明: 没有 reassign 原语 —— 换技师必须先 complete 再 assign,保全历史
// ==========================================

use crate::domain::audit::{ActionType, AuditEntry};
use crate::domain::mechanic::CapacityCheck;
use crate::domain::request::ServiceRequest;
use crate::domain::types::RequestState;
use crate::repository::dispatch_repo::DispatchRepository;
use crate::repository::error::RepositoryError;
use crate::repository::mechanic_repo::MechanicRepository;
use crate::repository::request_repo::ServiceRequestRepository;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

// ==========================================
// DispatchError - 派工引擎错误
// ==========================================
// 全部为同步、不可重试的调用方错误 (IntegrityFault 除外)
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("服务请求未找到: {0}")]
    RequestNotFound(String),

    #[error("技师未找到: {0}")]
    MechanicNotFound(String),

    #[error("无效的状态转换: request_id={request_id}, from={from} to={to}")]
    InvalidState {
        request_id: String,
        from: RequestState,
        to: RequestState,
    },

    #[error("技师产能已满: mechanic_id={mechanic_id}, current_load={current_load}, max_load={max_load}")]
    CapacityExceeded {
        mechanic_id: String,
        current_load: i32,
        max_load: i32,
    },

    /// 数据完整性故障 (不变式被破坏,属内部错误而非调用方错误)
    #[error("数据完整性故障: {0}")]
    IntegrityFault(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

// ==========================================
// DispatchEngine - 派工引擎
// ==========================================
pub struct DispatchEngine {
    request_repo: Arc<ServiceRequestRepository>,
    mechanic_repo: Arc<MechanicRepository>,
    dispatch_repo: Arc<DispatchRepository>,
}

impl DispatchEngine {
    /// 创建派工引擎
    pub fn new(
        request_repo: Arc<ServiceRequestRepository>,
        mechanic_repo: Arc<MechanicRepository>,
        dispatch_repo: Arc<DispatchRepository>,
    ) -> Self {
        Self {
            request_repo,
            mechanic_repo,
            dispatch_repo,
        }
    }

    /// 派工: PENDING -> ASSIGNED
    ///
    /// 前置条件:
    /// - 请求存在且为 PENDING
    /// - 技师存在且 current_load < max_load
    ///
    /// 效果 (单事务,全有或全无):
    /// - 请求记录技师ID + 派工时间,状态置 ASSIGNED
    /// - 技师 current_load += 1
    /// - 追加日志 "Order Assigned"
    ///
    /// # 返回
    /// - Ok(ServiceRequest): 更新后的请求
    pub fn assign(
        &self,
        request_id: &str,
        mechanic_id: &str,
        actor: &str,
    ) -> DispatchResult<ServiceRequest> {
        let mut request = self
            .request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| DispatchError::RequestNotFound(request_id.to_string()))?;

        if request.status != RequestState::Pending {
            return Err(DispatchError::InvalidState {
                request_id: request_id.to_string(),
                from: request.status,
                to: RequestState::Assigned,
            });
        }

        let mechanic = self
            .mechanic_repo
            .find_by_id(mechanic_id)?
            .ok_or_else(|| DispatchError::MechanicNotFound(mechanic_id.to_string()))?;

        if !mechanic.can_take_order() {
            return Err(DispatchError::CapacityExceeded {
                mechanic_id: mechanic_id.to_string(),
                current_load: mechanic.current_load,
                max_load: mechanic.max_load,
            });
        }

        let now = Utc::now().naive_utc();
        request.status = RequestState::Assigned;
        request.assigned_mechanic_id = Some(mechanic_id.to_string());
        request.assigned_at = Some(now);

        let entry = AuditEntry::new(
            request_id,
            ActionType::OrderAssigned,
            Some(format!(
                "Assigned to {} ({})",
                mechanic.name, mechanic.specialization
            )),
            actor,
        );

        // 校验读与提交之间的窗口由仓储的 SQL 护栏收口:
        // 并发竞争中恰好一个 assign 提交成功,后到者在这里拿到领域错误
        self.dispatch_repo
            .commit_transition(
                &request,
                RequestState::Pending,
                mechanic_id,
                1,
                now,
                &entry,
            )
            .map_err(|e| match e {
                RepositoryError::InvalidStateTransition { from, .. } => {
                    DispatchError::InvalidState {
                        request_id: request_id.to_string(),
                        from: RequestState::from_db_str(&from).unwrap_or(RequestState::Assigned),
                        to: RequestState::Assigned,
                    }
                }
                RepositoryError::LoadOutOfRange {
                    mechanic_id,
                    current_load,
                    max_load,
                } => DispatchError::CapacityExceeded {
                    mechanic_id,
                    current_load,
                    max_load,
                },
                other => other.into(),
            })?;

        tracing::info!(
            request_id = %request_id,
            mechanic_id = %mechanic_id,
            load = mechanic.current_load + 1,
            "派工完成"
        );
        Ok(request)
    }

    /// 完工: ASSIGNED -> COMPLETED
    ///
    /// 前置条件:
    /// - 请求存在且为 ASSIGNED,且有在修技师
    ///   (ASSIGNED 却无技师属不变式被破坏 —— 中止操作并记录,绝不静默把负载减成负数)
    ///
    /// 效果 (单事务,全有或全无):
    /// - 请求记录完工时间 + 可选费用/评分,状态置 COMPLETED
    /// - 技师 current_load -= 1
    /// - 追加日志 "Work Completed"
    pub fn complete(
        &self,
        request_id: &str,
        actor: &str,
        actual_cost: Option<f64>,
        service_rating: Option<f64>,
    ) -> DispatchResult<ServiceRequest> {
        let mut request = self
            .request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| DispatchError::RequestNotFound(request_id.to_string()))?;

        if request.status != RequestState::Assigned {
            return Err(DispatchError::InvalidState {
                request_id: request_id.to_string(),
                from: request.status,
                to: RequestState::Completed,
            });
        }

        let mechanic_id = match request.assigned_mechanic_id.clone() {
            Some(id) => id,
            None => {
                tracing::error!(
                    request_id = %request_id,
                    "ASSIGNED 请求缺少在修技师,中止完工操作"
                );
                return Err(DispatchError::IntegrityFault(format!(
                    "ASSIGNED 请求 {} 没有在修技师",
                    request_id
                )));
            }
        };

        let mechanic = self
            .mechanic_repo
            .find_by_id(&mechanic_id)?
            .ok_or_else(|| {
                tracing::error!(
                    request_id = %request_id,
                    mechanic_id = %mechanic_id,
                    "在修技师记录不存在,中止完工操作"
                );
                DispatchError::IntegrityFault(format!(
                    "请求 {} 的在修技师 {} 不存在",
                    request_id, mechanic_id
                ))
            })?;

        if mechanic.current_load <= 0 {
            tracing::error!(
                mechanic_id = %mechanic_id,
                current_load = mechanic.current_load,
                "技师负载即将为负,中止完工操作"
            );
            return Err(DispatchError::IntegrityFault(format!(
                "技师 {} 负载为 {},无法再减",
                mechanic_id, mechanic.current_load
            )));
        }

        let now = Utc::now().naive_utc();
        request.status = RequestState::Completed;
        request.completed_at = Some(now);
        request.actual_cost = actual_cost;
        request.service_rating = service_rating;

        let entry = AuditEntry::new(
            request_id,
            ActionType::WorkCompleted,
            Some(format!("Completed by {}", mechanic.name)),
            actor,
        );

        self.dispatch_repo
            .commit_transition(
                &request,
                RequestState::Assigned,
                &mechanic_id,
                -1,
                now,
                &entry,
            )
            .map_err(|e| match e {
                RepositoryError::InvalidStateTransition { from, .. } => {
                    DispatchError::InvalidState {
                        request_id: request_id.to_string(),
                        from: RequestState::from_db_str(&from).unwrap_or(RequestState::Completed),
                        to: RequestState::Completed,
                    }
                }
                RepositoryError::LoadOutOfRange {
                    mechanic_id,
                    current_load,
                    ..
                } => {
                    tracing::error!(
                        mechanic_id = %mechanic_id,
                        current_load,
                        "技师负载即将为负,完工提交被拒"
                    );
                    DispatchError::IntegrityFault(format!(
                        "技师 {} 负载为 {},无法再减",
                        mechanic_id, current_load
                    ))
                }
                other => other.into(),
            })?;

        tracing::info!(
            request_id = %request_id,
            mechanic_id = %mechanic_id,
            load = mechanic.current_load - 1,
            "完工登记"
        );
        Ok(request)
    }
}
