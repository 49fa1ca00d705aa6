use domain::{DomainError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ApplicationError {
    /// 是否由调用方输入导致（不应重试）
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ApplicationError::Domain(_))
    }
}
