use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    traits::StoreError,
};

/// Records a withdrawal. Points can only be spent against a given order number once, so a second withdrawal for the
/// same number fails with [`StoreError::DuplicateWithdrawal`].
pub async fn insert_withdrawal(
    owner: &str,
    withdrawal: &NewWithdrawal,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, StoreError> {
    let result = sqlx::query_as::<_, Withdrawal>(
        r#"
            INSERT INTO withdrawals (owner, order_number, amount, processed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(owner)
    .bind(withdrawal.order_number.as_str())
    .bind(withdrawal.amount.value())
    .bind(now)
    .fetch_one(conn)
    .await;
    match result {
        Ok(w) => {
            debug!("🗃️ {owner} withdrew {} points against order {}", w.amount, w.order_number);
            Ok(w)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StoreError::DuplicateWithdrawal(withdrawal.order_number.clone()))
        },
        Err(e) => Err(e.into()),
    }
}

/// All withdrawals made by `owner`, newest first.
pub async fn fetch_withdrawals_for_owner(
    owner: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals WHERE owner = $1 ORDER BY processed_at DESC, id DESC")
        .bind(owner)
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}
