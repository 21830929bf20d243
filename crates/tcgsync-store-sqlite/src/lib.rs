//! SQLite backend for the tcgsync catalog store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each import runs as one closure on
//! that thread inside a single transaction; the synchronous reconciliation
//! steps live in [`sets`], [`cards`] and [`prices`].

mod cards;
mod collections;
mod encode;
mod prices;
mod schema;
mod sets;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
