//! 领域模型错误定义
//!
//! 区分两类失败：输入本身不合法（不重试、不落库），以及计数存储的失败
//! （瞬时故障会由调用方按退避策略重试）。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 入站反应事件不合法
    #[error("无效事件: {field}: {reason}")]
    InvalidEvent { field: String, reason: String },

    /// 聚合查询参数不合法
    #[error("无效查询: {field}: {reason}")]
    InvalidQuery { field: String, reason: String },
}

impl DomainError {
    /// 创建无效事件错误
    pub fn invalid_event(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// 创建无效查询错误
    pub fn invalid_query(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 计数存储错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// 存储不可用（连接失败、超时、节点忙）
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// 存储限流
    #[error("store throttled: {message}")]
    Throttled { message: String },

    /// 存储返回了不可重试的错误
    #[error("store backend error: {message}")]
    Backend { message: String },

    /// 已存储的数据无法解析
    #[error("malformed record {key}: {message}")]
    Malformed { key: String, message: String },

    /// 重试次数耗尽
    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: Box<StoreError>,
    },

    /// 超过整体截止时间
    #[error("{operation} exceeded deadline of {deadline_ms}ms")]
    DeadlineExceeded { operation: String, deadline_ms: u64 },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::Throttled {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn malformed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// 是否为可重试的瞬时错误
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Throttled { .. })
    }
}

/// 存储结果类型
pub type StoreResult<T> = Result<T, StoreError>;
