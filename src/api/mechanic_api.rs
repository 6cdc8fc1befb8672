// ==========================================
// 汽车维修派工系统 - 技师管理 API
// ==========================================
// 职责: 技师增删查、可接单列表
// 红线: current_load 不提供任何直接修改入口 —— 负载只随派工/完工变化
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::mechanic::Mechanic;
use crate::repository::mechanic_repo::MechanicRepository;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// 请求/响应结构
// ==========================================

/// 新建技师参数
#[derive(Debug, Clone, Deserialize)]
pub struct NewMechanic {
    pub name: String,
    pub specialization: String,
    pub experience_years: i32,
    pub rating: f64,
    /// 最大并行工单数;缺省时取配置 default_max_load
    pub max_load: Option<i32>,
}

/// 技师信息 (对外视图,含派生状态)
#[derive(Debug, Clone, Serialize)]
pub struct MechanicInfo {
    pub mechanic_id: String,
    pub name: String,
    pub specialization: String,
    pub experience_years: i32,
    pub rating: f64,
    pub current_load: i32,
    pub max_load: i32,
    /// 派生状态: AVAILABLE / BUSY (每次查询重算,永不落库)
    pub status: String,
}

impl From<Mechanic> for MechanicInfo {
    fn from(m: Mechanic) -> Self {
        let status = m.status().to_string();
        Self {
            mechanic_id: m.mechanic_id,
            name: m.name,
            specialization: m.specialization,
            experience_years: m.experience_years,
            rating: m.rating,
            current_load: m.current_load,
            max_load: m.max_load,
            status,
        }
    }
}

// ==========================================
// MechanicApi - 技师管理 API
// ==========================================
pub struct MechanicApi {
    mechanic_repo: Arc<MechanicRepository>,
    config: Arc<ConfigManager>,
}

impl MechanicApi {
    /// 创建新的MechanicApi实例
    pub fn new(mechanic_repo: Arc<MechanicRepository>, config: Arc<ConfigManager>) -> Self {
        Self {
            mechanic_repo,
            config,
        }
    }

    /// 新增技师
    ///
    /// 校验: 姓名/专长非空, rating ∈ [0,5], max_load > 0
    /// current_load 固定从 0 开始
    pub fn add(&self, new_mechanic: NewMechanic) -> ApiResult<MechanicInfo> {
        if new_mechanic.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("技师姓名不能为空".to_string()));
        }
        if new_mechanic.specialization.trim().is_empty() {
            return Err(ApiError::InvalidInput("技师专长不能为空".to_string()));
        }
        if !(0.0..=5.0).contains(&new_mechanic.rating) {
            return Err(ApiError::ValidationError(format!(
                "评分必须在 [0,5] 区间,实际为 {}",
                new_mechanic.rating
            )));
        }
        if new_mechanic.experience_years < 0 {
            return Err(ApiError::ValidationError(
                "从业年限不能为负".to_string(),
            ));
        }

        let max_load = match new_mechanic.max_load {
            Some(v) => v,
            None => self.config.get_default_max_load()?,
        };
        if max_load <= 0 {
            return Err(ApiError::ValidationError(format!(
                "最大并行工单数必须 > 0,实际为 {}",
                max_load
            )));
        }

        let now = Utc::now().naive_utc();
        let mechanic = Mechanic {
            mechanic_id: Uuid::new_v4().to_string(),
            name: new_mechanic.name.trim().to_string(),
            specialization: new_mechanic.specialization.trim().to_string(),
            experience_years: new_mechanic.experience_years,
            rating: new_mechanic.rating,
            current_load: 0,
            max_load,
            created_at: now,
            updated_at: now,
        };

        self.mechanic_repo.insert(&mechanic)?;
        tracing::info!(mechanic_id = %mechanic.mechanic_id, max_load, "新增技师");
        Ok(mechanic.into())
    }

    /// 按ID查询技师
    pub fn get(&self, mechanic_id: &str) -> ApiResult<MechanicInfo> {
        if mechanic_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("技师ID不能为空".to_string()));
        }
        let mechanic = self
            .mechanic_repo
            .find_by_id(mechanic_id)?
            .ok_or_else(|| ApiError::NotFound(format!("技师(id={})不存在", mechanic_id)))?;
        Ok(mechanic.into())
    }

    /// 查询全部技师
    pub fn list(&self) -> ApiResult<Vec<MechanicInfo>> {
        let mechanics = self.mechanic_repo.list_all()?;
        Ok(mechanics.into_iter().map(MechanicInfo::from).collect())
    }

    /// 查询可接单技师
    ///
    /// 排序: current_load 升序 (均衡负载), rating 降序 —— 调度员参考顺序
    pub fn find_available(&self) -> ApiResult<Vec<MechanicInfo>> {
        let mechanics = self.mechanic_repo.find_available()?;
        Ok(mechanics.into_iter().map(MechanicInfo::from).collect())
    }

    /// 删除技师
    ///
    /// 持有在修工单 (current_load > 0) 时拒绝删除
    /// 最终判定在 SQL 护栏: 校验与删除之间并发派上工单也删不掉
    pub fn remove(&self, mechanic_id: &str) -> ApiResult<()> {
        if mechanic_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("技师ID不能为空".to_string()));
        }

        let rows = self.mechanic_repo.delete_if_idle(mechanic_id)?;
        if rows == 0 {
            // 区分: 不存在 vs 仍有负载
            return match self.mechanic_repo.find_by_id(mechanic_id)? {
                Some(mechanic) => Err(ApiError::Conflict(format!(
                    "技师 {} 仍有 {} 个在修工单,不能删除",
                    mechanic_id, mechanic.current_load
                ))),
                None => Err(ApiError::NotFound(format!(
                    "技师(id={})不存在",
                    mechanic_id
                ))),
            };
        }

        tracing::info!(mechanic_id = %mechanic_id, "删除技师");
        Ok(())
    }
}
