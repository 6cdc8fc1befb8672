// ==========================================
// 汽车维修派工系统 - 配件追踪引擎
// ==========================================
// 履约链: ORDERED -> SHIPPED -> DELIVERED -> INSTALLED (单调不回退)
// 红线: 本引擎是 fulfill_state 的唯一写入者
// 说明: 配件履约独立于工单生命周期 —— 完工后仍可登记/推进配件
// ==========================================

use crate::domain::audit::{ActionType, AuditEntry};
use crate::domain::part::PartUsage;
use crate::domain::types::PartState;
use crate::repository::error::RepositoryError;
use crate::repository::part_repo::PartUsageRepository;
use crate::repository::request_repo::ServiceRequestRepository;
use std::sync::Arc;
use thiserror::Error;

// ==========================================
// PartsError - 配件追踪错误
// ==========================================
#[derive(Error, Debug)]
pub enum PartsError {
    #[error("服务请求未找到: {0}")]
    RequestNotFound(String),

    #[error("配件条目未找到: request_id={request_id}, part_index={part_index}")]
    PartNotFound { request_id: String, part_index: i32 },

    #[error("无效的履约状态转换: from={from} to={to}")]
    InvalidTransition { from: PartState, to: PartState },

    #[error("数据验证失败: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type PartsResult<T> = Result<T, PartsError>;

/// 新配件条目参数
#[derive(Debug, Clone)]
pub struct NewPartUsage {
    pub part_name: String,
    pub part_number: Option<String>,
    pub quantity: i32,
    pub unit_cost: Option<f64>,
    pub supplier: Option<String>,
    /// true 表示配件已在库 (IN_STOCK 终态捷径),否则默认 ORDERED
    pub in_stock: bool,
    pub estimated_delivery: Option<chrono::NaiveDate>,
}

// ==========================================
// PartsTracker - 配件追踪引擎
// ==========================================
pub struct PartsTracker {
    request_repo: Arc<ServiceRequestRepository>,
    part_repo: Arc<PartUsageRepository>,
}

impl PartsTracker {
    /// 创建配件追踪引擎
    pub fn new(
        request_repo: Arc<ServiceRequestRepository>,
        part_repo: Arc<PartUsageRepository>,
    ) -> Self {
        Self {
            request_repo,
            part_repo,
        }
    }

    /// 登记配件条目
    ///
    /// 初始状态: ORDERED,或调用方声明在库时为 IN_STOCK
    /// (库存核对由调用方完成,不在本引擎范围)
    ///
    /// # 返回
    /// - Ok(PartUsage): 已落库的配件条目 (含分配到的 part_index)
    pub fn add_part(
        &self,
        request_id: &str,
        new_part: NewPartUsage,
        actor: &str,
    ) -> PartsResult<PartUsage> {
        if new_part.part_name.trim().is_empty() {
            return Err(PartsError::Validation("配件名称不能为空".to_string()));
        }
        if new_part.quantity < 1 {
            return Err(PartsError::Validation(format!(
                "配件数量必须 >= 1,实际为 {}",
                new_part.quantity
            )));
        }

        self.request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| PartsError::RequestNotFound(request_id.to_string()))?;

        let fulfill_state = if new_part.in_stock {
            PartState::InStock
        } else {
            PartState::Ordered
        };

        let mut part = PartUsage {
            request_id: request_id.to_string(),
            part_index: 0, // 仓储在事务内分配
            part_name: new_part.part_name,
            part_number: new_part.part_number,
            quantity: new_part.quantity,
            unit_cost: new_part.unit_cost,
            supplier: new_part.supplier,
            fulfill_state,
            estimated_delivery: new_part.estimated_delivery,
        };

        let action = if new_part.in_stock {
            ActionType::PartsInStock
        } else {
            ActionType::PartsOrdered
        };
        let entry = AuditEntry::new(
            request_id,
            action,
            Some(format!("{} x{}", part.part_name, part.quantity)),
            actor,
        );

        let part_index = self.part_repo.insert_with_log(&part, &entry)?;
        part.part_index = part_index;

        tracing::info!(
            request_id = %request_id,
            part_index,
            state = %part.fulfill_state,
            "配件登记"
        );
        Ok(part)
    }

    /// 推进配件履约状态
    ///
    /// 校验: 只允许沿履约链向前 (可跨步),禁止回退/原地/IN_STOCK 参与
    pub fn advance(
        &self,
        request_id: &str,
        part_index: i32,
        new_state: PartState,
        actor: &str,
    ) -> PartsResult<PartUsage> {
        self.request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| PartsError::RequestNotFound(request_id.to_string()))?;

        let mut part = self
            .part_repo
            .find_one(request_id, part_index)?
            .ok_or_else(|| PartsError::PartNotFound {
                request_id: request_id.to_string(),
                part_index,
            })?;

        if !part.fulfill_state.can_advance_to(new_state) {
            return Err(PartsError::InvalidTransition {
                from: part.fulfill_state,
                to: new_state,
            });
        }

        let action = match new_state {
            PartState::Shipped => ActionType::PartsShipped,
            PartState::Delivered => ActionType::PartsDelivered,
            PartState::Installed => ActionType::PartsInstalled,
            // can_advance_to 已排除其余目标态
            _ => ActionType::PartsOrdered,
        };
        let entry = AuditEntry::new(
            request_id,
            action,
            Some(format!("{}: {} -> {}", part.part_name, part.fulfill_state, new_state)),
            actor,
        );

        // 护栏: 并发推进只有一个提交成功,后到者按实际落库状态报错
        self.part_repo
            .update_state_with_log(request_id, part_index, part.fulfill_state, new_state, &entry)
            .map_err(|e| match e {
                RepositoryError::InvalidStateTransition { from, .. } => {
                    PartsError::InvalidTransition {
                        from: PartState::from_db_str(&from).unwrap_or(part.fulfill_state),
                        to: new_state,
                    }
                }
                other => other.into(),
            })?;
        part.fulfill_state = new_state;

        tracing::info!(
            request_id = %request_id,
            part_index,
            state = %new_state,
            "配件履约推进"
        );
        Ok(part)
    }

    /// 查询请求的配件子账 (按登记顺序)
    pub fn list_parts(&self, request_id: &str) -> PartsResult<Vec<PartUsage>> {
        self.request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| PartsError::RequestNotFound(request_id.to_string()))?;

        Ok(self.part_repo.find_by_request(request_id)?)
    }
}
