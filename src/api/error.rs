// ==========================================
// 设备维修工单系统 - API层错误类型
// ==========================================
// 职责: 定义对外错误分类, 转换引擎/仓储错误为可分支的错误种类
// 约束: 调用方按错误种类分支, 不解析错误文本
// ==========================================

use crate::domain::types::TicketStatus;
use crate::engine::lifecycle::LifecycleError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// 字段级校验违规
// ==========================================

/// 单个字段的校验违规
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ==========================================
// API 错误分类
// ==========================================

/// API层错误类型
///
/// 所有错误都不致命: 调用方可重试或呈现给用户;
/// 瞬态错误 (锁竞争) 单列为 Unavailable, 与业务错误区分
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 业务错误 =====
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 重复行项等冲突 (调用方应改为调整已有数据)
    #[error("资源冲突: {0}")]
    Conflict(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    /// 操作要求的前置状态不满足 (如对非 CLOSED 工单 Reopen)
    #[error("无效的工单状态: {0}")]
    InvalidState(String),

    /// 库存不足 (指明备件与缺口, 整批扣减未发生)
    #[error("库存不足: part_id={part_id}, requested={requested}, available={available}, shortfall={shortfall}")]
    InsufficientStock {
        part_id: String,
        requested: i64,
        available: i64,
        shortfall: i64,
    },

    #[error("数据验证失败: {message}")]
    ValidationError {
        message: String,
        violations: Vec<FieldError>,
    },

    // ===== 瞬态错误 (可安全重试) =====
    #[error("服务暂不可用, 请重试: {0}")]
    Unavailable(String),

    // ===== 数据访问错误 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 便捷构造: 单条消息的校验错误
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// 是否为可安全重试的瞬态错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Unavailable(_))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制: 另一调用方已提交, 重读后重试即可
            RepositoryError::OptimisticLockFailure {
                ticket_id,
                expected,
                actual,
            } => ApiError::Unavailable(format!(
                "工单{}已被并发修改 (期望revision={}, 实际revision={})",
                ticket_id, expected, actual
            )),
            RepositoryError::LockError(msg) => ApiError::Unavailable(msg),

            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::Conflict(msg),
            RepositoryError::ForeignKeyViolation(msg) => ApiError::Conflict(msg),
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::ValidationError(msg) => ApiError::validation(msg),
            RepositoryError::FieldValueError { field, message } => ApiError::ValidationError {
                message: format!("字段{}错误: {}", field, message),
                violations: vec![FieldError::new(field, message)],
            },
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 LifecycleError 转换
// ==========================================
impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::TicketNotFound { id } => {
                ApiError::NotFound(format!("工单(id={})不存在", id))
            }
            LifecycleError::PartNotFound { id } => {
                ApiError::NotFound(format!("备件(id={})不存在", id))
            }
            LifecycleError::LineItemNotFound { ticket_id, part_id } => ApiError::NotFound(
                format!("行项(ticket_id={}, part_id={})不存在", ticket_id, part_id),
            ),
            LifecycleError::DuplicateLineItem { ticket_id, part_id } => ApiError::Conflict(
                format!(
                    "备件已挂在该工单上, 请调整已有行项数量: ticket_id={}, part_id={}",
                    ticket_id, part_id
                ),
            ),
            LifecycleError::InvalidTransition { from, to } => {
                ApiError::InvalidTransition { from, to }
            }
            LifecycleError::InvalidState { status, message } => {
                ApiError::InvalidState(format!("{} (当前状态={})", message, status))
            }
            LifecycleError::InsufficientStock {
                part_id,
                requested,
                available,
            } => ApiError::InsufficientStock {
                part_id,
                shortfall: requested - available,
                requested,
                available,
            },
            LifecycleError::Validation(msg) => ApiError::validation(msg),
            LifecycleError::Repository(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
