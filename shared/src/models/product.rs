//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// `id` is assigned by the storage engine on creation and stable for the
/// record's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub category: String,
    /// Unit list price (non-negative)
    pub price: f64,
    /// Units on hand
    pub stock: u32,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: u32,
}

impl ProductCreate {
    pub fn with_id(self, id: u64) -> Product {
        Product {
            id,
            name: self.name,
            category: self.category,
            price: self.price,
            stock: self.stock,
        }
    }
}
