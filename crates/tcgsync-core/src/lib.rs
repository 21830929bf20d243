//! Core types and algorithms for the trading-card catalog sync.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the feed record shapes, the canonical catalog model, the pure parts of the
//! reconciliation engine (number normalisation, era classification, the
//! generic child-collection diff, price selection) and the [`CatalogStore`]
//! trait implemented by storage backends.
//!
//! [`CatalogStore`]: store::CatalogStore

pub mod card;
pub mod era;
pub mod error;
pub mod feed;
pub mod number;
pub mod price;
pub mod reconcile;
pub mod set;
pub mod store;

pub use error::{Error, Result};
