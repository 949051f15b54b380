use chrono::{DateTime, Utc};
use log::{debug, trace};
use loyalty_common::Points;
use sqlx::SqliteConnection;

use crate::{db_types::UserBalance, traits::StoreError};

/// Returns the balance for `owner`, creating an empty one if it does not exist yet.
///
/// The insert is issued first, so when this is the first statement in a transaction, the transaction takes the write
/// lock immediately.
pub async fn fetch_or_create_balance(
    owner: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<UserBalance, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO user_balances (owner, current_balance, total_withdrawn, created_at, updated_at)
            VALUES ($1, 0, 0, $2, $2)
            ON CONFLICT (owner) DO NOTHING;
        "#,
    )
    .bind(owner)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() > 0 {
        debug!("🗃️ Created a new balance record for {owner}");
    }
    let balance = sqlx::query_as("SELECT * FROM user_balances WHERE owner = $1").bind(owner).fetch_one(conn).await?;
    Ok(balance)
}

pub async fn fetch_balance(owner: &str, conn: &mut SqliteConnection) -> Result<Option<UserBalance>, sqlx::Error> {
    let balance =
        sqlx::query_as("SELECT * FROM user_balances WHERE owner = $1").bind(owner).fetch_optional(conn).await?;
    Ok(balance)
}

/// Adds `amount` to the current balance of `owner`. The balance record must exist.
///
/// The new balance is computed here rather than in SQL, since SQLite silently promotes an overflowing integer sum to a
/// REAL. On overflow, nothing is written and [`StoreError::BalanceOverflow`] is returned.
pub async fn credit_balance(
    owner: &str,
    amount: Points,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), StoreError> {
    let balance =
        fetch_balance(owner, &mut *conn).await?.ok_or_else(|| StoreError::AccountNotFound(owner.to_string()))?;
    let new_balance = balance
        .current_balance
        .checked_add(amount)
        .ok_or_else(|| StoreError::BalanceOverflow { owner: owner.to_string(), amount })?;
    sqlx::query("UPDATE user_balances SET current_balance = $1, updated_at = $2 WHERE owner = $3")
        .bind(new_balance.value())
        .bind(now)
        .bind(owner)
        .execute(conn)
        .await?;
    trace!("🗃️ Credited {amount} points to {owner}");
    Ok(())
}

/// Moves `amount` from the current balance of `owner` to their withdrawn total, if and only if the current balance is
/// at least `amount`. Returns `false` (and writes nothing) otherwise.
pub async fn debit_balance(
    owner: &str,
    amount: Points,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE user_balances SET
                current_balance = current_balance - $1,
                total_withdrawn = total_withdrawn + $1,
                updated_at = $2
            WHERE owner = $3 AND current_balance >= $1
        "#,
    )
    .bind(amount.value())
    .bind(now)
    .bind(owner)
    .execute(conn)
    .await?;
    let debited = result.rows_affected() > 0;
    if debited {
        trace!("🗃️ Debited {amount} points from {owner}");
    }
    Ok(debited)
}
