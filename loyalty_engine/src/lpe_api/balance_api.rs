//! Balance queries and withdrawals.
use std::fmt::Debug;

use log::*;
use loyalty_common::Points;

use crate::{
    db_types::{NewWithdrawal, OrderNumber, UserBalance, Withdrawal},
    lpe_api::errors::BalanceApiError,
    traits::AccountManagement,
};

pub struct BalanceApi<B> {
    db: B,
}

impl<B: Debug> Debug for BalanceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BalanceApi ({:?})", self.db)
    }
}

impl<B> BalanceApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The balance for `owner`. Users we have never heard of have an empty balance.
    pub async fn balance(&self, owner: &str) -> Result<UserBalance, BalanceApiError> {
        let balance = self.db.fetch_balance(owner).await?;
        Ok(balance.unwrap_or_else(|| UserBalance::empty(owner)))
    }

    /// Spends `sum` points from `owner`'s balance against the order number `order`.
    pub async fn withdraw(&self, owner: &str, order: &str, sum: Points) -> Result<UserBalance, BalanceApiError> {
        let order_number = order.parse::<OrderNumber>()?;
        if !sum.is_positive() {
            return Err(BalanceApiError::InvalidAmount(sum));
        }
        let balance = self.db.withdraw(owner, NewWithdrawal::new(order_number, sum)).await?;
        info!("{owner} withdrew {sum} points against order {order}. {} points left", balance.current_balance);
        Ok(balance)
    }

    pub async fn withdrawals(&self, owner: &str) -> Result<Vec<Withdrawal>, BalanceApiError> {
        let withdrawals = self.db.fetch_withdrawals_for_user(owner).await?;
        Ok(withdrawals)
    }
}
