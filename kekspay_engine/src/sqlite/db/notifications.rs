use sqlx::SqliteConnection;

use crate::db_types::{OrderId, PaymentStatus};

/// Records a notification delivery. Returns `false` if the same `(keks_id, outcome)` pair was recorded before.
pub async fn record_delivery(
    keks_id: &str,
    outcome: PaymentStatus,
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT OR IGNORE INTO notifications (keks_id, outcome, order_id) VALUES ($1, $2, $3)")
        .bind(keks_id)
        .bind(outcome.as_str())
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
