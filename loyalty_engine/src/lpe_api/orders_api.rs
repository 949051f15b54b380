//! Accepts purchase order numbers from users.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderNumber},
    lpe_api::errors::OrdersApiError,
    traits::{AccountManagement, InsertOrderResult},
};

pub struct OrdersApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrdersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrdersApi ({:?})", self.db)
    }
}

impl<B> OrdersApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Validates `number` and stores it as a new order for `owner`. Submitting the same number twice is harmless.
    pub async fn submit_order(&self, owner: &str, number: &str) -> Result<InsertOrderResult, OrdersApiError> {
        let number = number.parse::<OrderNumber>()?;
        let result = self.db.submit_order(owner, &number).await?;
        if let InsertOrderResult::Inserted(order) = &result {
            info!("New order {} submitted by {owner}", order.number);
        }
        Ok(result)
    }

    /// All orders submitted by `owner`, newest first.
    pub async fn orders_for_user(&self, owner: &str) -> Result<Vec<Order>, OrdersApiError> {
        let orders = self.db.fetch_orders_for_user(owner).await?;
        Ok(orders)
    }
}
