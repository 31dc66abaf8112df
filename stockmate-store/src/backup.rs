//! Backup/restore coordinator
//!
//! Exports the whole database to a single portable JSON document and
//! restores from one. Validation happens strictly before any destructive
//! step; once the clears have run, restore is best-effort per record: a
//! record that fails to parse or insert is logged and skipped, and the
//! summary reports exactly how many records went each way.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use shared::models::{LOW_STOCK_THRESHOLD_KEY, Product, Sale};

use crate::error::{StoreError, StoreResult};
use crate::store::{Collection, StockStore};

/// Backup document format version
pub const BACKUP_VERSION: &str = "1.0.0";

/// Application name stamped into every backup
pub const APP_NAME: &str = "StockMate";

/// Portable snapshot of all collections
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub app_name: String,
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<BackupSettings>,
}

/// Settings section of a backup. Optional and additive on import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<u32>,
}

/// Outcome of a restore, with explicit per-collection skip counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub products_imported: usize,
    pub products_skipped: usize,
    pub sales_imported: usize,
    pub sales_skipped: usize,
    pub settings_applied: bool,
}

impl ImportSummary {
    pub fn skipped(&self) -> usize {
        self.products_skipped + self.sales_skipped
    }
}

/// Snapshot every collection into a backup document.
pub fn export(store: &StockStore) -> StoreResult<BackupDocument> {
    let products = store.get_all_products()?;
    let sales = store.get_all_sales()?;

    // A failed settings read degrades to an empty settings section rather
    // than failing the whole export.
    let low_stock_threshold = match store.get_setting(LOW_STOCK_THRESHOLD_KEY) {
        Ok(value) => value.and_then(|v| v.as_u64()).map(|n| n as u32),
        Err(e) => {
            warn!(error = %e, "could not export settings");
            None
        }
    };

    info!(
        products = products.len(),
        sales = sales.len(),
        "exporting backup"
    );

    Ok(BackupDocument {
        timestamp: Utc::now(),
        version: BACKUP_VERSION.to_string(),
        app_name: APP_NAME.to_string(),
        products,
        sales,
        settings: Some(BackupSettings { low_stock_threshold }),
    })
}

/// Export as pretty-printed JSON, ready to hand to the user.
pub fn export_json(store: &StockStore) -> StoreResult<String> {
    Ok(serde_json::to_string_pretty(&export(store)?)?)
}

/// The original download name: `stockmate-backup-<unix-millis>.json`.
pub fn default_backup_filename() -> String {
    format!("stockmate-backup-{}.json", Utc::now().timestamp_millis())
}

/// Write a backup file at `path`.
pub fn export_to_file(store: &StockStore, path: impl AsRef<Path>) -> StoreResult<()> {
    let json = export_json(store)?;
    fs::write(path.as_ref(), json)?;
    info!(path = %path.as_ref().display(), "backup written");
    Ok(())
}

/// Restore the database from a backup document.
///
/// Fails with [`StoreError::InvalidBackupFormat`] before touching any data
/// if the document does not parse or lacks `products`/`sales` arrays. After
/// that point products and sales are cleared and re-inserted one by one;
/// faulty records are skipped, never fatal, so a partially damaged backup
/// still restores everything salvageable.
pub fn import(store: &StockStore, json: &str) -> StoreResult<ImportSummary> {
    let document: Value = serde_json::from_str(json)
        .map_err(|e| StoreError::InvalidBackupFormat(format!("not valid JSON: {e}")))?;

    let products = require_array(&document, "products")?;
    let sales = require_array(&document, "sales")?;

    // Validation is done; from here on the restore is destructive.
    store.clear(Collection::Products)?;
    store.clear(Collection::Sales)?;

    let mut summary = ImportSummary::default();

    for raw in products {
        match serde_json::from_value::<Product>(raw.clone())
            .map_err(StoreError::from)
            .and_then(|product| store.insert_product(&product))
        {
            Ok(()) => summary.products_imported += 1,
            Err(e) => {
                warn!(error = %e, record = %raw, "skipping product during restore");
                summary.products_skipped += 1;
            }
        }
    }

    for raw in sales {
        match serde_json::from_value::<Sale>(raw.clone())
            .map_err(StoreError::from)
            .and_then(|sale| store.insert_sale(&sale))
        {
            Ok(()) => summary.sales_imported += 1,
            Err(e) => {
                warn!(error = %e, record = %raw, "skipping sale during restore");
                summary.sales_skipped += 1;
            }
        }
    }

    // Settings are optional and additive; unrecognized keys are ignored.
    if let Some(threshold) = document
        .get("settings")
        .and_then(|s| s.get(LOW_STOCK_THRESHOLD_KEY))
        .and_then(Value::as_u64)
    {
        match store.set_setting(LOW_STOCK_THRESHOLD_KEY, &Value::from(threshold)) {
            Ok(()) => summary.settings_applied = true,
            Err(e) => warn!(error = %e, "could not restore settings"),
        }
    }

    info!(
        products_imported = summary.products_imported,
        products_skipped = summary.products_skipped,
        sales_imported = summary.sales_imported,
        sales_skipped = summary.sales_skipped,
        "restore finished"
    );
    Ok(summary)
}

/// Restore from a backup file on disk.
pub fn import_from_file(store: &StockStore, path: impl AsRef<Path>) -> StoreResult<ImportSummary> {
    let json = fs::read_to_string(path.as_ref())?;
    import(store, &json)
}

fn require_array<'a>(document: &'a Value, field: &str) -> StoreResult<&'a Vec<Value>> {
    document
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::InvalidBackupFormat(format!("missing `{field}` array")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::ProductCreate;

    fn populated_store() -> StockStore {
        let store = StockStore::open_in_memory().unwrap();
        let rice = store
            .add_product(ProductCreate {
                name: "Rice".to_string(),
                category: "Grains".to_string(),
                price: 50.0,
                stock: 20,
            })
            .unwrap();
        store
            .add_product(ProductCreate {
                name: "Beans".to_string(),
                category: "Grains".to_string(),
                price: 80.0,
                stock: 4,
            })
            .unwrap();
        store.record_sale(rice, 5, Some(55.0)).unwrap();
        store
    }

    #[test]
    fn export_stamps_format_metadata() {
        let store = populated_store();

        let document = export(&store).unwrap();
        assert_eq!(document.version, BACKUP_VERSION);
        assert_eq!(document.app_name, APP_NAME);
        assert_eq!(document.products.len(), 2);
        assert_eq!(document.sales.len(), 1);
        assert_eq!(
            document.settings.unwrap().low_stock_threshold,
            Some(shared::models::DEFAULT_LOW_STOCK_THRESHOLD)
        );
    }

    #[test]
    fn export_uses_wire_field_names() {
        let store = populated_store();

        let json = export_json(&store).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("appName").is_some());
        let sale = &value["sales"][0];
        assert!(sale.get("productId").is_some());
        assert!(sale.get("productName").is_some());
        assert_eq!(sale["total"], Value::from(275.0));
    }

    #[test]
    fn export_import_round_trip_is_collection_equal() {
        let store = populated_store();
        let products_before = store.get_all_products().unwrap();
        let sales_before = store.get_all_sales().unwrap();

        let json = export_json(&store).unwrap();
        store.clear(Collection::Products).unwrap();
        store.clear(Collection::Sales).unwrap();

        let summary = import(&store, &json).unwrap();
        assert_eq!(summary.products_imported, 2);
        assert_eq!(summary.sales_imported, 1);
        assert_eq!(summary.skipped(), 0);
        assert!(summary.settings_applied);

        assert_eq!(store.get_all_products().unwrap(), products_before);
        assert_eq!(store.get_all_sales().unwrap(), sales_before);
    }

    #[test]
    fn import_without_required_sections_leaves_data_untouched() {
        let store = populated_store();
        let products_before = store.get_all_products().unwrap();
        let sales_before = store.get_all_sales().unwrap();

        for document in [
            r#"{"products": []}"#,
            r#"{"sales": []}"#,
            r#"{"products": "nope", "sales": []}"#,
            "not json at all",
        ] {
            let err = import(&store, document).unwrap_err();
            assert!(matches!(err, StoreError::InvalidBackupFormat(_)));
        }

        assert_eq!(store.get_all_products().unwrap(), products_before);
        assert_eq!(store.get_all_sales().unwrap(), sales_before);
    }

    #[test]
    fn import_skips_faulty_records_and_reports_counts() {
        let store = StockStore::open_in_memory().unwrap();

        // One well-formed product, one with an empty name (rejected by the
        // engine's write validation), one that is not a product at all.
        let document = r#"{
            "products": [
                {"id": 1, "name": "Rice", "category": "Grains", "price": 50.0, "stock": 20},
                {"id": 2, "name": "", "category": "Grains", "price": 80.0, "stock": 4},
                {"widget": true}
            ],
            "sales": [
                {"id": 1, "productId": 1, "productName": "Rice", "quantity": 5,
                 "price": 55.0, "total": 275.0, "date": "2026-08-27",
                 "timestamp": "2026-08-27T10:00:00Z"},
                {"id": 2, "productId": 1}
            ]
        }"#;

        let summary = import(&store, document).unwrap();
        assert_eq!(summary.products_imported, 1);
        assert_eq!(summary.products_skipped, 2);
        assert_eq!(summary.sales_imported, 1);
        assert_eq!(summary.sales_skipped, 1);
        assert!(!summary.settings_applied);

        assert_eq!(store.get_all_products().unwrap().len(), 1);
        assert_eq!(store.get_all_sales().unwrap().len(), 1);
    }

    #[test]
    fn import_applies_known_settings_and_ignores_the_rest() {
        let store = StockStore::open_in_memory().unwrap();

        let document = r#"{
            "products": [],
            "sales": [],
            "settings": {"lowStockThreshold": 5, "theme": "dark"}
        }"#;

        let summary = import(&store, document).unwrap();
        assert!(summary.settings_applied);
        assert_eq!(store.low_stock_threshold(), 5);
        assert!(store.get_setting("theme").unwrap().is_none());
    }

    #[test]
    fn imported_ids_do_not_collide_with_later_creates() {
        let store = StockStore::open_in_memory().unwrap();

        let document = r#"{
            "products": [
                {"id": 100, "name": "Oil", "category": "Pantry", "price": 120.0, "stock": 8}
            ],
            "sales": []
        }"#;
        import(&store, document).unwrap();

        let next = store
            .add_product(ProductCreate {
                name: "Salt".to_string(),
                category: "Pantry".to_string(),
                price: 15.0,
                stock: 30,
            })
            .unwrap();
        assert!(next > 100);
    }
}
