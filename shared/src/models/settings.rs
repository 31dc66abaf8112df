//! Settings Model
//!
//! The settings collection is a string-keyed map of arbitrary JSON values.
//! `lowStockThreshold` is the only key the engine itself defines; it is
//! seeded on first open and read back with a documented fallback.

/// Key of the low-stock alert threshold setting
pub const LOW_STOCK_THRESHOLD_KEY: &str = "lowStockThreshold";

/// Threshold applied when the setting is absent or unreadable
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;
