//! Shared types for StockMate
//!
//! Data models and pure reporting helpers shared between the storage
//! engine and the display layers (dashboard, product table, sales form,
//! reports page).

pub mod models;
pub mod report;

// Re-exports
pub use models::*;
pub use serde::{Deserialize, Serialize};
