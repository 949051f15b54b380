use crate::{
    db_types::{NewWithdrawal, Order, OrderNumber, UserBalance, Withdrawal},
    traits::{InsertOrderResult, StoreError},
};

/// The `AccountManagement` trait defines behaviour for the user-facing side of the backend.
///
/// A balance record is created for a user the first time they submit an order or attempt a withdrawal. Balances only
/// increase via [`crate::OrderStore::apply_resolution`] and only decrease via [`AccountManagement::withdraw`].
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Stores a new order for `owner` with `NEW` status. Order numbers are unique across all users.
    async fn submit_order(&self, owner: &str, number: &OrderNumber) -> Result<InsertOrderResult, StoreError>;

    /// All orders submitted by `owner`, newest first.
    async fn fetch_orders_for_user(&self, owner: &str) -> Result<Vec<Order>, StoreError>;

    /// The balance for `owner`. If the user has never submitted an order, `None` is returned.
    async fn fetch_balance(&self, owner: &str) -> Result<Option<UserBalance>, StoreError>;

    /// Spends `withdrawal.amount` points from `owner`'s balance against the given order number, atomically.
    ///
    /// The withdrawal is accepted iff the amount is positive and the balance would not go negative; spending the
    /// balance down to exactly zero is allowed. Otherwise nothing is written and
    /// [`StoreError::InsufficientFunds`] (or [`StoreError::InvalidAmount`]) is returned.
    ///
    /// Returns the updated balance.
    async fn withdraw(&self, owner: &str, withdrawal: NewWithdrawal) -> Result<UserBalance, StoreError>;

    /// All withdrawals made by `owner`, newest first.
    async fn fetch_withdrawals_for_user(&self, owner: &str) -> Result<Vec<Withdrawal>, StoreError>;
}
