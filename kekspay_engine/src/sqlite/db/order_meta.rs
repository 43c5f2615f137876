//! Named metadata fields attached to orders.
use sqlx::SqliteConnection;

use crate::db_types::OrderId;

pub async fn fetch_meta(
    order_id: &OrderId,
    key: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<String>, sqlx::Error> {
    let value: Option<(String,)> =
        sqlx::query_as("SELECT meta_value FROM order_meta WHERE order_id = $1 AND meta_key = $2")
            .bind(order_id.as_str())
            .bind(key)
            .fetch_optional(conn)
            .await?;
    Ok(value.map(|(v,)| v))
}

/// Writes the field, replacing any existing value.
pub async fn upsert_meta(
    order_id: &OrderId,
    key: &str,
    value: &str,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO order_meta (order_id, meta_key, meta_value) VALUES ($1, $2, $3)
            ON CONFLICT (order_id, meta_key)
            DO UPDATE SET meta_value = excluded.meta_value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(order_id.as_str())
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}

/// Writes the field only if it is not there yet. Returns `true` if a row was written.
pub async fn insert_meta_if_absent(
    order_id: &OrderId,
    key: &str,
    value: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT OR IGNORE INTO order_meta (order_id, meta_key, meta_value) VALUES ($1, $2, $3)")
        .bind(order_id.as_str())
        .bind(key)
        .bind(value)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Writes the field unless its current value is `locked_a` or `locked_b`. Returns `true` if a row was written.
///
/// The check and the write are a single statement, so a concurrent writer cannot slip in between.
pub async fn upsert_meta_unless(
    order_id: &OrderId,
    key: &str,
    value: &str,
    (locked_a, locked_b): (&str, &str),
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO order_meta (order_id, meta_key, meta_value) VALUES ($1, $2, $3)
            ON CONFLICT (order_id, meta_key)
            DO UPDATE SET meta_value = excluded.meta_value, updated_at = CURRENT_TIMESTAMP
            WHERE order_meta.meta_value NOT IN ($4, $5)
        "#,
    )
    .bind(order_id.as_str())
    .bind(key)
    .bind(value)
    .bind(locked_a)
    .bind(locked_b)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
