//! SQLite backend for the KEKS Pay gateway.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
