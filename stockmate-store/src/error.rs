//! Storage error taxonomy
//!
//! Every engine and backup operation returns [`StoreResult`]. Platform
//! failures (database unavailable, transaction/commit errors) convert via
//! `#[from]`; domain failures carry enough context for the caller to render
//! a message without re-reading the store.

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed fields on a create/update; nothing was written.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    /// A sale asked for more units than the product has; nothing was written.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    /// Backup document failed validation; no destructive step was taken.
    #[error("Invalid backup format: {0}")]
    InvalidBackupFormat(String),

    /// The on-disk schema was written by a newer release.
    #[error("Unsupported schema version {found} (this build supports up to {supported})")]
    SchemaVersion { found: u64, supported: u64 },
}

pub type StoreResult<T> = Result<T, StoreError>;
