//! Embedded storage for the StockMate inventory and sales tracker.
//!
//! [`StockStore`] wraps a single-file [redb](https://docs.rs/redb) database
//! holding three collections (products, sales, settings) plus a meta table
//! for the schema version and id counters. The [`backup`] module turns the
//! whole database into one portable JSON document and restores from it.

pub mod backup;
pub mod error;
pub mod store;

pub use backup::{BackupDocument, BackupSettings, ImportSummary};
pub use error::{StoreError, StoreResult};
pub use store::{Collection, StockStore};
