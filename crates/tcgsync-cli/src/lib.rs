//! Import orchestration for the `tcgsync` binary.
//!
//! - [`settings`]: layered configuration (TOML file + `TCGSYNC_*` env).
//! - [`feed`]: the paginated HTTP price feed client.
//! - [`import`]: set, card and price imports against any
//!   [`CatalogStore`](tcgsync_core::store::CatalogStore).
//! - [`partition`]: the bounded worker pool with fixed retry used for
//!   whole-catalog price imports.

pub mod feed;
pub mod import;
pub mod partition;
pub mod settings;
