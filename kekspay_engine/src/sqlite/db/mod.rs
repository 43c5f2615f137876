//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or create an atomic transaction as the need arises and call
//! through to the functions without any other changes.
//!
//! Writes go through a [`WriteTransaction`] rather than `pool.begin()`. SQLite cannot upgrade a read lock to a write
//! lock while another connection is writing, and fails with `SQLITE_BUSY` straight away instead of waiting. Taking the
//! write lock up front with `BEGIN IMMEDIATE` makes concurrent writers queue on the busy timeout instead.
use std::{
    ops::{Deref, DerefMut},
    str::FromStr,
    time::Duration,
};

use log::warn;
use sqlx::{
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    Sqlite,
    SqliteConnection,
    SqlitePool,
};

pub mod notifications;
pub mod order_meta;
pub mod order_notes;
pub mod orders;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// A transaction that holds SQLite's write lock from the start.
///
/// Dereferences to the underlying connection, so the functions in this module take `&mut tx` as is. If the
/// transaction is dropped without [`commit`](Self::commit) or [`rollback`](Self::rollback), for instance because the
/// request future was cancelled, the connection is closed instead of going back to the pool, which rolls it back.
pub struct WriteTransaction {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTransaction {
    pub async fn begin(pool: &SqlitePool) -> Result<Self, SqlxError> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(Self { conn: Some(conn) })
    }

    pub async fn commit(mut self) -> Result<(), SqlxError> {
        self.finish("COMMIT").await
    }

    pub async fn rollback(mut self) -> Result<(), SqlxError> {
        self.finish("ROLLBACK").await
    }

    /// Commits if `result` is `Ok` and rolls back otherwise, then hands `result` back.
    pub async fn complete<T, E: From<SqlxError>>(self, result: Result<T, E>) -> Result<T, E> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            },
            Err(e) => {
                self.rollback().await?;
                Err(e)
            },
        }
    }

    async fn finish(&mut self, statement: &str) -> Result<(), SqlxError> {
        if let Some(conn) = self.conn.as_mut() {
            sqlx::query(statement).execute(&mut **conn).await?;
        }
        // Back to the pool only once the transaction has ended
        self.conn = None;
        Ok(())
    }
}

impl Deref for WriteTransaction {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        match &self.conn {
            Some(conn) => &**conn,
            // `conn` is only taken by `finish` and `drop`, and `finish` consumes the transaction
            None => unreachable!("transaction used after it ended"),
        }
    }
}

impl DerefMut for WriteTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.conn {
            Some(conn) => &mut **conn,
            None => unreachable!("transaction used after it ended"),
        }
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            warn!("🗃️ Write transaction dropped before it ended. Closing its connection.");
            drop(conn.detach());
        }
    }
}
