use chrono::{DateTime, Utc};
use log::{debug, trace};
use loyalty_common::Points;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{Order, OrderNumber, OrderStatusType};

/// Inserts a new order with `NEW` status. If an order with the same number already exists, nothing is written and
/// `None` is returned.
///
/// This is not atomic. Embed the call in a transaction and pass `&mut *tx` if the owner's balance row must be created
/// in the same unit of work.
pub async fn insert_order(
    number: &OrderNumber,
    owner: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (number, owner, status, accrual, uploaded_at, updated_at)
            VALUES ($1, $2, 'NEW', 0, $3, $3)
            ON CONFLICT (number) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(number.as_str())
    .bind(owner)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    if let Some(order) = &order {
        debug!("🗃️ Order [{}] inserted for {} with id {}", order.number, order.owner, order.id);
    }
    Ok(order)
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches all orders with any of the given statuses, oldest upload first. Ties are broken on the row id, so the
/// ordering is total.
pub async fn fetch_orders_with_status(
    statuses: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE status IN (");
    let mut separated = builder.separated(", ");
    for status in statuses {
        separated.push_bind(status.to_string());
    }
    separated.push_unseparated(") ORDER BY uploaded_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// All orders belonging to `owner`, newest first.
pub async fn fetch_orders_for_owner(owner: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE owner = $1 ORDER BY uploaded_at DESC, id DESC")
        .bind(owner)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Sets the status and accrual of the order, but only if its current status is one of `allowed`.
///
/// Returns the order's owner if a row was updated, and `None` otherwise. The guard makes this safe to replay: once an
/// order has left the `allowed` set, repeating the call changes nothing.
pub async fn conditional_status_update(
    number: &OrderNumber,
    status: OrderStatusType,
    accrual: Points,
    allowed: &[OrderStatusType],
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<String>, sqlx::Error> {
    if allowed.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
    builder.push_bind(status.to_string());
    builder.push(", accrual = ");
    builder.push_bind(accrual.value());
    builder.push(", updated_at = ");
    builder.push_bind(now);
    builder.push(" WHERE number = ");
    builder.push_bind(number.as_str());
    builder.push(" AND status IN (");
    let mut separated = builder.separated(", ");
    for s in allowed {
        separated.push_bind(s.to_string());
    }
    separated.push_unseparated(") RETURNING owner");
    trace!("🗃️ Executing query: {}", builder.sql());
    let owner: Option<(String,)> = builder.build_query_as().fetch_optional(conn).await?;
    Ok(owner.map(|(o,)| o))
}
