//! `SqliteDatabase` is the SQLite implementation of the [`OrderStore`] trait.
//!
//! Every call that writes runs inside a [`WriteTransaction`], so a single order is never left half-updated and
//! concurrent requests for the same order are applied one after the other. Writes for an order that does not exist
//! are rejected by the foreign keys on the order tables and reported as [`OrderStoreError::OrderNotFound`].
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqliteConnection, SqlitePool};

use super::db::{new_pool, notifications, order_meta, order_notes, orders, WriteTransaction};
use crate::{
    db_types::{
        NewOrder,
        Order,
        OrderId,
        OrderNote,
        PaymentStatus,
        Settlement,
        SettlementResult,
        META_KEKS_ID,
        META_PAYMENT_STATUS,
    },
    traits::{OrderStore, OrderStoreError},
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

impl OrderStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError> {
        let mut tx = WriteTransaction::begin(&self.pool).await?;
        let result = orders::idempotent_insert(order, &mut tx).await.map_err(OrderStoreError::from);
        tx.complete(result).await
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn get_meta(&self, order_id: &OrderId, key: &str) -> Result<Option<String>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let value = order_meta::fetch_meta(order_id, key, &mut conn).await?;
        Ok(value)
    }

    async fn set_meta(&self, order_id: &OrderId, key: &str, value: &str) -> Result<(), OrderStoreError> {
        let mut tx = WriteTransaction::begin(&self.pool).await?;
        let result = order_meta::upsert_meta(order_id, key, value, &mut tx).await.map_err(for_order(order_id));
        tx.complete(result).await?;
        trace!("🗃️ Order {order_id}: {key} = {value}");
        Ok(())
    }

    async fn add_meta_if_absent(&self, order_id: &OrderId, key: &str, value: &str) -> Result<bool, OrderStoreError> {
        let mut tx = WriteTransaction::begin(&self.pool).await?;
        let result =
            order_meta::insert_meta_if_absent(order_id, key, value, &mut tx).await.map_err(for_order(order_id));
        let added = tx.complete(result).await?;
        if added {
            trace!("🗃️ Order {order_id}: {key} = {value}");
        }
        Ok(added)
    }

    async fn set_status_unless_terminal(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
    ) -> Result<bool, OrderStoreError> {
        let mut tx = WriteTransaction::begin(&self.pool).await?;
        let terminal = (PaymentStatus::Approved.as_str(), PaymentStatus::Declined.as_str());
        let result = order_meta::upsert_meta_unless(order_id, META_PAYMENT_STATUS, status.as_str(), terminal, &mut tx)
            .await
            .map_err(for_order(order_id));
        tx.complete(result).await
    }

    async fn add_order_note(&self, order_id: &OrderId, note: &str) -> Result<(), OrderStoreError> {
        let mut tx = WriteTransaction::begin(&self.pool).await?;
        let result = order_notes::insert_note(order_id, note, &mut tx).await.map_err(for_order(order_id));
        let note = tx.complete(result).await?;
        debug!("🗃️ Note #{} added to order {order_id}", note.id);
        Ok(())
    }

    async fn fetch_order_notes(&self, order_id: &OrderId) -> Result<Vec<OrderNote>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let notes = order_notes::fetch_notes(order_id, &mut conn).await?;
        Ok(notes)
    }

    async fn apply_settlement(&self, settlement: Settlement) -> Result<SettlementResult, OrderStoreError> {
        let mut tx = WriteTransaction::begin(&self.pool).await?;
        let result = settle(settlement, &mut tx).await;
        tx.complete(result).await
    }

    async fn close(&mut self) -> Result<(), OrderStoreError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Records the delivery and, unless it was seen before, applies its outcome to the order.
async fn settle(settlement: Settlement, conn: &mut SqliteConnection) -> Result<SettlementResult, OrderStoreError> {
    let Settlement { order_id, keks_id, status, note } = settlement;
    let recorded =
        notifications::record_delivery(&keks_id, status, &order_id, conn).await.map_err(for_order(&order_id))?;
    if !recorded {
        debug!("🗃️ Notification {keks_id} ({status}) for order {order_id} was already recorded");
        return Ok(SettlementResult::Duplicate);
    }
    order_meta::upsert_meta(&order_id, META_PAYMENT_STATUS, status.as_str(), conn).await?;
    order_meta::upsert_meta(&order_id, META_KEKS_ID, &keks_id, conn).await?;
    order_notes::insert_note(&order_id, &note, conn).await?;
    let order = orders::touch_order(&order_id, conn)
        .await?
        .ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))?;
    debug!("🗃️ Settlement {keks_id} applied. Order {order_id} is now {status}");
    Ok(SettlementResult::Applied(order))
}

/// Writes to an unknown order fail on a foreign key. Report those as a missing order.
fn for_order(order_id: &OrderId) -> impl Fn(sqlx::Error) -> OrderStoreError + '_ {
    move |e| {
        let missing = e.as_database_error().is_some_and(|db_err| db_err.is_foreign_key_violation());
        if missing {
            OrderStoreError::OrderNotFound(order_id.clone())
        } else {
            OrderStoreError::from(e)
        }
    }
}

impl SqliteDatabase {
    /// Creates a new database API object. The database file is created if it does not exist.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}
