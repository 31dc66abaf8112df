//! Data models
//!
//! Shared between the storage engine and the display layers, and serialized
//! as-is into backup documents (camelCase field names on multi-word fields).
//! Record IDs are `u64`, assigned by the storage engine from a persisted
//! monotonic counter.

pub mod product;
pub mod sale;
pub mod settings;

// Re-exports
pub use product::*;
pub use sale::*;
pub use settings::*;
