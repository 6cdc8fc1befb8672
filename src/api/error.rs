// ==========================================
// 汽车维修派工系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换引擎/仓储错误为用户友好的错误消息
// 说明: 所有错误均为同步、不可重试 —— 指向调用方/调度员的输入或状态问题
// ==========================================

use crate::engine::dispatch::DispatchError;
use crate::engine::parts::PartsError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    /// 技师产能约束违反
    #[error("技师产能已满: mechanic_id={mechanic_id}, current_load={current_load}, max_load={max_load}")]
    CapacityExceeded {
        mechanic_id: String,
        current_load: i32,
        max_load: i32,
    },

    /// 配件履约状态回退/非法推进
    #[error("无效的履约状态转换: from={from} to={to}")]
    InvalidPartTransition { from: String, to: String },

    /// 删除被在修工单阻止等操作冲突
    #[error("操作冲突: {0}")]
    Conflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::Conflict(format!("外键约束违反: {}", msg))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::ValidationError(msg),
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            // 正常路径在引擎层已映射为 CapacityExceeded/IntegrityFault
            RepositoryError::LoadOutOfRange {
                mechanic_id,
                current_load,
                max_load,
            } => ApiError::CapacityExceeded {
                mechanic_id,
                current_load,
                max_load,
            },
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 DispatchError 转换
// ==========================================
impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::RequestNotFound(id) => {
                ApiError::NotFound(format!("服务请求(id={})不存在", id))
            }
            DispatchError::MechanicNotFound(id) => {
                ApiError::NotFound(format!("技师(id={})不存在", id))
            }
            DispatchError::InvalidState { from, to, .. } => ApiError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
            DispatchError::CapacityExceeded {
                mechanic_id,
                current_load,
                max_load,
            } => ApiError::CapacityExceeded {
                mechanic_id,
                current_load,
                max_load,
            },
            DispatchError::IntegrityFault(msg) => ApiError::InternalError(msg),
            DispatchError::Repository(e) => e.into(),
        }
    }
}

// ==========================================
// 从 PartsError 转换
// ==========================================
impl From<PartsError> for ApiError {
    fn from(err: PartsError) -> Self {
        match err {
            PartsError::RequestNotFound(id) => {
                ApiError::NotFound(format!("服务请求(id={})不存在", id))
            }
            PartsError::PartNotFound {
                request_id,
                part_index,
            } => ApiError::NotFound(format!(
                "配件条目(request_id={}, part_index={})不存在",
                request_id, part_index
            )),
            PartsError::InvalidTransition { from, to } => ApiError::InvalidPartTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
            PartsError::Validation(msg) => ApiError::ValidationError(msg),
            PartsError::Repository(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
