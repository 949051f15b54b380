use loyalty_common::Points;
use thiserror::Error;

use crate::{
    db_types::{OrderNumber, OrderNumberError},
    traits::StoreError,
};

#[derive(Debug, Clone, Error)]
pub enum OrdersApiError {
    #[error("Invalid order number. {0}")]
    InvalidOrderNumber(#[from] OrderNumberError),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for OrdersApiError {
    fn from(e: StoreError) -> Self {
        OrdersApiError::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum BalanceApiError {
    #[error("Invalid order number. {0}")]
    InvalidOrderNumber(#[from] OrderNumberError),
    #[error("Withdrawal amounts must be positive, not {0}")]
    InvalidAmount(Points),
    #[error("Insufficient funds. {requested} was requested, but only {available} is available")]
    InsufficientFunds { available: Points, requested: Points },
    #[error("Points have already been withdrawn against order {0}")]
    DuplicateWithdrawal(OrderNumber),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for BalanceApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InsufficientFunds { available, requested } => {
                BalanceApiError::InsufficientFunds { available, requested }
            },
            StoreError::DuplicateWithdrawal(n) => BalanceApiError::DuplicateWithdrawal(n),
            StoreError::InvalidAmount(p) => BalanceApiError::InvalidAmount(p),
            e => BalanceApiError::DatabaseError(e.to_string()),
        }
    }
}
