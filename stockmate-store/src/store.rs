//! redb-based storage engine for the three StockMate collections
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `u64` | `Product` | Inventory records |
//! | `sales` | `u64` | `Sale` | Sales history (append-only) |
//! | `settings` | `&str` | JSON value | Key/value settings |
//! | `meta` | `&str` | `u64` | Schema version and id counters |
//!
//! Record values are JSON-serialized. Record ids come from persisted
//! monotonic counters in `meta` and are never reused, even after deletion;
//! explicit-id inserts (the restore path) advance the counter past the
//! inserted id.
//!
//! # Transactions
//!
//! Each CRUD operation is one write transaction and either fully applies or
//! not at all. [`StockStore::record_sale`] spans the products and sales
//! tables in a single transaction, so an interrupted sale never leaves the
//! sale inserted without the stock decrement (or vice versa).
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: once an operation
//! returns, the change survives process death, and the database file is
//! always in a consistent state.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde_json::Value;
use tracing::{debug, info, warn};

use shared::models::{
    DEFAULT_LOW_STOCK_THRESHOLD, LOW_STOCK_THRESHOLD_KEY, Product, ProductCreate, Sale,
    SaleCreate,
};

use crate::error::{StoreError, StoreResult};

/// Table for products: key = product id, value = JSON-serialized Product
const PRODUCTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("products");

/// Table for sales: key = sale id, value = JSON-serialized Sale
const SALES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("sales");

/// Table for settings: key = setting name, value = JSON-serialized value
const SETTINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

/// Table for schema version and id counters
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const SCHEMA_VERSION_KEY: &str = "schema_version";
const NEXT_PRODUCT_ID_KEY: &str = "next_product_id";
const NEXT_SALE_ID_KEY: &str = "next_sale_id";

/// Schema version written on first open. Bumps are reserved for additive
/// changes (new tables); there are no destructive migrations.
pub const SCHEMA_VERSION: u64 = 1;

/// The three record collections of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Products,
    Sales,
    Settings,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Sales => "sales",
            Collection::Settings => "settings",
        }
    }
}

/// Storage engine backed by redb
///
/// An instance only exists once the database opened successfully; there is
/// no "not yet open" state callers can observe. Cloning shares the same
/// underlying database handle.
#[derive(Clone)]
pub struct StockStore {
    db: Arc<Database>,
}

impl StockStore {
    /// Open or create the database at the given path.
    ///
    /// First open creates all tables, writes the schema version, and seeds
    /// the default low-stock threshold. Reopening with a matching version
    /// changes nothing; a version written by a newer release fails with
    /// [`StoreError::SchemaVersion`].
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path.as_ref())?;
        let store = Self::initialize(db)?;
        info!(path = %path.as_ref().display(), "StockMate database ready");
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::initialize(db)
    }

    fn initialize(db: Database) -> StoreResult<Self> {
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(PRODUCTS_TABLE)?;
            let _ = txn.open_table(SALES_TABLE)?;

            let mut meta = txn.open_table(META_TABLE)?;
            let schema_version = meta.get(SCHEMA_VERSION_KEY)?.map(|g| g.value());
            match schema_version {
                None => {
                    meta.insert(SCHEMA_VERSION_KEY, SCHEMA_VERSION)?;
                }
                Some(found) if found > SCHEMA_VERSION => {
                    return Err(StoreError::SchemaVersion {
                        found,
                        supported: SCHEMA_VERSION,
                    });
                }
                Some(_) => {}
            }
            drop(meta);

            let mut settings = txn.open_table(SETTINGS_TABLE)?;
            if settings.get(LOW_STOCK_THRESHOLD_KEY)?.is_none() {
                let value = serde_json::to_vec(&Value::from(DEFAULT_LOW_STOCK_THRESHOLD))?;
                settings.insert(LOW_STOCK_THRESHOLD_KEY, value.as_slice())?;
            }
        }
        txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Claim the next id from a counter in the meta table.
    fn next_id(txn: &WriteTransaction, counter_key: &str) -> StoreResult<u64> {
        let mut meta = txn.open_table(META_TABLE)?;
        let id = meta.get(counter_key)?.map(|g| g.value()).unwrap_or(1);
        meta.insert(counter_key, id + 1)?;
        Ok(id)
    }

    /// Advance a counter past an explicitly supplied id, so later
    /// engine-assigned ids cannot collide with imported records.
    fn reserve_id(txn: &WriteTransaction, counter_key: &str, id: u64) -> StoreResult<()> {
        let mut meta = txn.open_table(META_TABLE)?;
        let next = meta.get(counter_key)?.map(|g| g.value()).unwrap_or(1);
        if id >= next {
            meta.insert(counter_key, id + 1)?;
        }
        Ok(())
    }

    // ========== Product Operations ==========

    /// Validate and persist a new product; returns the assigned id.
    pub fn add_product(&self, create: ProductCreate) -> StoreResult<u64> {
        validate_product_fields(&create.name, create.price)?;

        let txn = self.db.begin_write()?;
        let id = Self::next_id(&txn, NEXT_PRODUCT_ID_KEY)?;
        {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let product = create.with_id(id);
            let value = serde_json::to_vec(&product)?;
            table.insert(id, value.as_slice())?;
        }
        txn.commit()?;

        debug!(id, "product added");
        Ok(id)
    }

    /// Overwrite the stored record entirely (no partial-field merge).
    ///
    /// Put semantics: an id the store has never assigned is accepted and the
    /// id counter advances past it.
    pub fn update_product(&self, product: &Product) -> StoreResult<()> {
        validate_product_fields(&product.name, product.price)?;
        self.put_product(product)
    }

    /// Insert a product record as-is, preserving its id (restore path).
    pub fn insert_product(&self, product: &Product) -> StoreResult<()> {
        validate_product_fields(&product.name, product.price)?;
        self.put_product(product)
    }

    fn put_product(&self, product: &Product) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        Self::reserve_id(&txn, NEXT_PRODUCT_ID_KEY, product.id)?;
        {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let value = serde_json::to_vec(product)?;
            table.insert(product.id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Delete a product. Idempotent: deleting an absent id is not an error.
    pub fn delete_product(&self, id: u64) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            table.remove(id)?.is_some()
        };
        txn.commit()?;

        debug!(id, removed, "product delete");
        Ok(())
    }

    /// Get a product by id
    pub fn get_product(&self, id: u64) -> StoreResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;

        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All products in id (insertion) order; empty store yields an empty vec.
    pub fn get_all_products(&self) -> StoreResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;

        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }
        Ok(products)
    }

    // ========== Sale Operations ==========

    /// Persist a sale; returns the assigned id.
    ///
    /// The engine does not check that `product_id` refers to a live product;
    /// sales legitimately outlive the products they reference.
    pub fn add_sale(&self, create: SaleCreate) -> StoreResult<u64> {
        validate_sale_fields(create.quantity, create.price, create.total)?;

        let txn = self.db.begin_write()?;
        let id = Self::next_id(&txn, NEXT_SALE_ID_KEY)?;
        {
            let mut table = txn.open_table(SALES_TABLE)?;
            let sale = create.with_id(id);
            let value = serde_json::to_vec(&sale)?;
            table.insert(id, value.as_slice())?;
        }
        txn.commit()?;

        debug!(id, "sale added");
        Ok(id)
    }

    /// Insert a sale record as-is, preserving its id (restore path).
    pub fn insert_sale(&self, sale: &Sale) -> StoreResult<()> {
        validate_sale_fields(sale.quantity, sale.price, sale.total)?;

        let txn = self.db.begin_write()?;
        Self::reserve_id(&txn, NEXT_SALE_ID_KEY, sale.id)?;
        {
            let mut table = txn.open_table(SALES_TABLE)?;
            let value = serde_json::to_vec(sale)?;
            table.insert(sale.id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// All sales in id (insertion) order; empty store yields an empty vec.
    pub fn get_all_sales(&self) -> StoreResult<Vec<Sale>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SALES_TABLE)?;

        let mut sales = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            sales.push(serde_json::from_slice(value.value())?);
        }
        Ok(sales)
    }

    /// Record a sale against a product: insert the sale and decrement the
    /// product's stock in one transaction.
    ///
    /// Charges `price_override` when given, otherwise the product's current
    /// list price. `total` is fixed here and never recomputed. A quantity
    /// exceeding the available stock fails with
    /// [`StoreError::InsufficientStock`] and changes nothing.
    pub fn record_sale(
        &self,
        product_id: u64,
        quantity: u32,
        price_override: Option<f64>,
    ) -> StoreResult<Sale> {
        if quantity == 0 {
            return Err(StoreError::InvalidInput(
                "sale quantity must be at least 1".to_string(),
            ));
        }

        let txn = self.db.begin_write()?;
        let sale = {
            let mut products = txn.open_table(PRODUCTS_TABLE)?;

            let mut product: Product = match products.get(product_id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StoreError::ProductNotFound(product_id)),
            };

            if quantity > product.stock {
                return Err(StoreError::InsufficientStock {
                    requested: quantity,
                    available: product.stock,
                });
            }

            let price = price_override.unwrap_or(product.price);
            if !price.is_finite() || price < 0.0 {
                return Err(StoreError::InvalidInput(
                    "sale price must be a non-negative number".to_string(),
                ));
            }

            let timestamp = chrono::Utc::now();
            let sale = SaleCreate {
                product_id,
                product_name: product.name.clone(),
                quantity,
                price,
                total: price * quantity as f64,
                date: timestamp.format("%Y-%m-%d").to_string(),
                timestamp,
            }
            .with_id(Self::next_id(&txn, NEXT_SALE_ID_KEY)?);

            let mut sales = txn.open_table(SALES_TABLE)?;
            let sale_value = serde_json::to_vec(&sale)?;
            sales.insert(sale.id, sale_value.as_slice())?;

            product.stock -= quantity;
            let product_value = serde_json::to_vec(&product)?;
            products.insert(product_id, product_value.as_slice())?;

            sale
        };
        txn.commit()?;

        debug!(sale_id = sale.id, product_id, quantity, total = sale.total, "sale recorded");
        Ok(sale)
    }

    // ========== Settings Operations ==========

    /// Look up a setting. An unset key resolves to `None`, not an error.
    pub fn get_setting(&self, key: &str) -> StoreResult<Option<Value>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;

        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Write a setting, replacing any previous value.
    pub fn set_setting(&self, key: &str, value: &Value) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS_TABLE)?;
            let bytes = serde_json::to_vec(value)?;
            table.insert(key, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// The low-stock alert threshold, falling back to
    /// [`DEFAULT_LOW_STOCK_THRESHOLD`] when the setting is absent or
    /// unreadable. Never fails: a broken settings read must not block the
    /// rest of the application.
    pub fn low_stock_threshold(&self) -> u32 {
        match self.get_setting(LOW_STOCK_THRESHOLD_KEY) {
            Ok(Some(value)) => match value.as_u64() {
                Some(threshold) => threshold as u32,
                None => {
                    warn!(%value, "low-stock threshold is not an integer, using default");
                    DEFAULT_LOW_STOCK_THRESHOLD
                }
            },
            Ok(None) => DEFAULT_LOW_STOCK_THRESHOLD,
            Err(e) => {
                warn!(error = %e, "failed to load low-stock threshold, using default");
                DEFAULT_LOW_STOCK_THRESHOLD
            }
        }
    }

    // ========== Bulk Operations ==========

    /// Remove every record from the named collection. Irreversible.
    pub fn clear(&self, collection: Collection) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        match collection {
            Collection::Products => {
                txn.delete_table(PRODUCTS_TABLE)?;
                let _ = txn.open_table(PRODUCTS_TABLE)?;
            }
            Collection::Sales => {
                txn.delete_table(SALES_TABLE)?;
                let _ = txn.open_table(SALES_TABLE)?;
            }
            Collection::Settings => {
                txn.delete_table(SETTINGS_TABLE)?;
                let _ = txn.open_table(SETTINGS_TABLE)?;
            }
        }
        txn.commit()?;

        info!(collection = collection.name(), "collection cleared");
        Ok(())
    }

    /// Clear products and sales together, in one transaction (the
    /// "clear all data" action). Settings survive.
    pub fn clear_all_data(&self) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        txn.delete_table(PRODUCTS_TABLE)?;
        txn.delete_table(SALES_TABLE)?;
        let _ = txn.open_table(PRODUCTS_TABLE)?;
        let _ = txn.open_table(SALES_TABLE)?;
        txn.commit()?;

        info!("all product and sale data cleared");
        Ok(())
    }
}

fn validate_product_fields(name: &str, price: f64) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "product name must not be empty".to_string(),
        ));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(StoreError::InvalidInput(
            "product price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

fn validate_sale_fields(quantity: u32, price: f64, total: f64) -> StoreResult<()> {
    if quantity == 0 {
        return Err(StoreError::InvalidInput(
            "sale quantity must be at least 1".to_string(),
        ));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(StoreError::InvalidInput(
            "sale price must be a non-negative number".to_string(),
        ));
    }
    if !total.is_finite() || total < 0.0 {
        return Err(StoreError::InvalidInput(
            "sale total must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}
