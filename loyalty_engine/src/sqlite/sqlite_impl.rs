//! `SqliteDatabase` is a concrete implementation of a loyalty engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use loyalty_common::Points;
use sqlx::SqlitePool;

use super::db::{balances, db_url, new_pool, orders, withdrawals};
use crate::{
    db_types::{NewWithdrawal, Order, OrderNumber, OrderStatusType, UserBalance, Withdrawal},
    traits::{AccountManagement, InsertOrderResult, OrderStore, ResolutionOutcome, StoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `LP_DATABASE_URL`, or the default location if it is not set.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Creates a new database API object. The database file is created if it does not exist.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Migration failed: {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl OrderStore for SqliteDatabase {
    async fn list_pending(&self) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_with_status(&OrderStatusType::PENDING, &mut conn).await?;
        Ok(orders)
    }

    async fn apply_resolution(
        &self,
        number: &OrderNumber,
        new_status: OrderStatusType,
        accrual: Points,
    ) -> Result<ResolutionOutcome, StoreError> {
        let allowed = new_status.predecessors();
        if allowed.is_empty() {
            return Ok(ResolutionOutcome::NotApplicable);
        }
        let credited = match new_status {
            OrderStatusType::Processed => accrual,
            _ => Points::default(),
        };
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        // The guarded update goes first so that this transaction holds the write lock for the rest of the unit of work.
        let owner =
            match orders::conditional_status_update(number, new_status, credited, allowed, now, &mut tx).await? {
                Some(owner) => owner,
                None => {
                    debug!("🗃️ Order {number} is not in a state that can move to {new_status}. Nothing written.");
                    return Ok(ResolutionOutcome::NotApplicable);
                },
            };
        if credited.is_positive() {
            balances::credit_balance(&owner, credited, now, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {number} moved to {new_status}. {credited} points credited to {owner}");
        Ok(ResolutionOutcome::Applied { owner, status: new_status, credited })
    }

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn submit_order(&self, owner: &str, number: &OrderNumber) -> Result<InsertOrderResult, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        balances::fetch_or_create_balance(owner, now, &mut tx).await?;
        if let Some(order) = orders::insert_order(number, owner, now, &mut tx).await? {
            tx.commit().await?;
            return Ok(InsertOrderResult::Inserted(order));
        }
        // Nothing was written besides (possibly) an empty balance, which is rolled back when `tx` is dropped.
        let existing = orders::fetch_order_by_number(number, &mut tx)
            .await?
            .ok_or_else(|| StoreError::DatabaseError(format!("Order {number} conflicted on insert but does not exist")))?;
        if existing.owner == owner {
            debug!("🗃️ {owner} has already submitted order {number}");
            Ok(InsertOrderResult::AlreadySubmitted(existing))
        } else {
            info!("🗃️ {owner} tried to submit order {number}, which belongs to another user");
            Ok(InsertOrderResult::OwnedByAnotherUser)
        }
    }

    async fn fetch_orders_for_user(&self, owner: &str) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_owner(owner, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_balance(&self, owner: &str) -> Result<Option<UserBalance>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balances::fetch_balance(owner, &mut conn).await?;
        Ok(balance)
    }

    async fn withdraw(&self, owner: &str, withdrawal: NewWithdrawal) -> Result<UserBalance, StoreError> {
        if !withdrawal.amount.is_positive() {
            return Err(StoreError::InvalidAmount(withdrawal.amount));
        }
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let balance = balances::fetch_or_create_balance(owner, now, &mut tx).await?;
        if balance.total_withdrawn.checked_add(withdrawal.amount).is_none() {
            return Err(StoreError::BalanceOverflow { owner: owner.to_string(), amount: withdrawal.amount });
        }
        if !balances::debit_balance(owner, withdrawal.amount, now, &mut tx).await? {
            info!(
                "🗃️ {owner} tried to withdraw {} points, but only has {}",
                withdrawal.amount, balance.current_balance
            );
            return Err(StoreError::InsufficientFunds {
                available: balance.current_balance,
                requested: withdrawal.amount,
            });
        }
        withdrawals::insert_withdrawal(owner, &withdrawal, now, &mut tx).await?;
        let balance = balances::fetch_balance(owner, &mut tx)
            .await?
            .ok_or_else(|| StoreError::AccountNotFound(owner.to_string()))?;
        tx.commit().await?;
        Ok(balance)
    }

    async fn fetch_withdrawals_for_user(&self, owner: &str) -> Result<Vec<Withdrawal>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_owner(owner, &mut conn).await?;
        Ok(withdrawals)
    }
}
