use chrono::{DateTime, Utc};
use loyalty_common::Points;
use loyalty_engine::db_types::{Order, OrderStatusType, UserBalance, Withdrawal};
use serde::{Deserialize, Serialize};

/// An order as reported to its owner. `accrual` is only present once the order has been processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub number: String,
    pub status: OrderStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResult {
    fn from(order: Order) -> Self {
        let accrual = (order.status == OrderStatusType::Processed).then_some(order.accrual);
        Self { number: order.number.into(), status: order.status, accrual, uploaded_at: order.uploaded_at }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResult {
    pub current: Points,
    pub withdrawn: Points,
}

impl From<UserBalance> for BalanceResult {
    fn from(balance: UserBalance) -> Self {
        Self { current: balance.current_balance, withdrawn: balance.total_withdrawn }
    }
}

/// The body of a withdrawal request. `order` is validated by the engine, so it is kept as a plain string here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Points,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalResult {
    pub order: String,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResult {
    fn from(w: Withdrawal) -> Self {
        Self { order: w.order_number.into(), sum: w.amount, processed_at: w.processed_at }
    }
}
