//! Sale Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sale entity
///
/// Sales are append-only: once recorded they are only removed by a bulk
/// clear or a restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: u64,
    /// Soft reference to a product. The product may have been deleted since;
    /// consumers must render a missing lookup as "Unknown Product".
    pub product_id: u64,
    /// Snapshot of the product name at sale time, so history stays readable
    /// after the product is renamed or removed.
    pub product_name: String,
    pub quantity: u32,
    /// Unit price actually charged (may differ from the list price)
    pub price: f64,
    /// `quantity * price`, computed at creation and never recomputed
    pub total: f64,
    /// Calendar day (`YYYY-MM-DD`, UTC), used for daily/monthly grouping
    pub date: String,
    /// Creation instant, used for ordering
    pub timestamp: DateTime<Utc>,
}

/// Create sale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCreate {
    pub product_id: u64,
    pub product_name: String,
    pub quantity: u32,
    pub price: f64,
    pub total: f64,
    pub date: String,
    pub timestamp: DateTime<Utc>,
}

impl SaleCreate {
    pub fn with_id(self, id: u64) -> Sale {
        Sale {
            id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            price: self.price,
            total: self.total,
            date: self.date,
            timestamp: self.timestamp,
        }
    }
}
