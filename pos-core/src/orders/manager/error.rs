use crate::orders::traits::OrderError;
use crate::store::StorageError;
use shared::error::{AppError, ErrorCode};
use shared::order::CommandError;
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Order(#[from] OrderError),

    /// Rejected by a collaborator (role gate, table registry)
    #[error(transparent)]
    Rejected(#[from] AppError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => e.into(),
            ManagerError::Order(e) => e.into(),
            ManagerError::Rejected(e) => e,
            ManagerError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order not found: {id}"))
                    .with_detail("order_id", id)
            }
        }
    }
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        AppError::from(err).into()
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
