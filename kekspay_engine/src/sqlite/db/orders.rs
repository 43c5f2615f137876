use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewOrder, Order, OrderId};

/// Inserts the order into the database, returning `false` in the second parameter if the order already exists.
///
/// The insert comes first, so inside a write transaction no other writer can add the same order in between.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<(Order, bool), sqlx::Error> {
    let order_id = order.order_id.clone();
    if let Some(order) = insert_order(order, conn).await? {
        debug!("📝️ Order [{}] inserted with id {}", order.order_id, order.id);
        return Ok((order, true));
    }
    let existing = fetch_order_by_order_id(&order_id, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
    Ok((existing, false))
}

/// Inserts a new order, unless an order with the same `order_id` exists, in which case `None` is returned.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO orders (order_id, total, currency, success_url, cancel_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.total)
    .bind(order.currency)
    .bind(order.success_url)
    .bind(order.cancel_url)
    .fetch_optional(conn)
    .await
}

/// Returns the entry in the orders table for the corresponding `order_id`
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Bumps the `updated_at` timestamp of the order and returns the updated record.
pub async fn touch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("UPDATE orders SET updated_at = CURRENT_TIMESTAMP WHERE order_id = $1 RETURNING *")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await
}
