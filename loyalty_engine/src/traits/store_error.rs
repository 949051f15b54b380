use loyalty_common::Points;
use thiserror::Error;

use crate::db_types::OrderNumber;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("There is no balance record for user {0}")]
    AccountNotFound(String),
    #[error("Insufficient funds. {requested} was requested, but only {available} is available")]
    InsufficientFunds { available: Points, requested: Points },
    #[error("Points have already been withdrawn against order {0}")]
    DuplicateWithdrawal(OrderNumber),
    #[error("Withdrawal amounts must be positive, not {0}")]
    InvalidAmount(Points),
    #[error("Adding {amount} points to the balance of {owner} would overflow it")]
    BalanceOverflow { owner: String, amount: Points },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
