//! Import of exported documents.
//!
//! The hosted store the shops used before exported each collection as a
//! JSON array of loosely typed documents: camelCase keys, numbers sometimes
//! stored as strings, fields sometimes missing. Documents are checked here,
//! at the boundary, and stored through the same upserts as everything else.
//! Missing or unreadable numbers become 0; a document without its shop, item
//! name or (for daily records) date cannot be keyed and is skipped.

use crate::{
    core::{
        beverage::upsert_beverage_count,
        catalog::{get_shop_item, insert_shop_item, update_shop_item_order},
        edits::EntryRecord,
        flows::{FlowField, FlowFields, MAX_QUANTITY, compute_figures, parse_quantity},
        index::EntryKey,
        inventory::insert_entry,
        price::upsert_price,
        state::parse_date,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, instrument, warn};

type Document = Map<String, Value>;

/// A collection of exported documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Daily inventory entries
    Inventory,
    /// Per-shop prices
    Prices,
    /// Shop catalogs
    ShopItems,
    /// Beverage counter readings
    Beverages,
}

impl Collection {
    /// Collection name as used by the export
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Prices => "prices",
            Self::ShopItems => "shopItems",
            Self::Beverages => "beverages",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "inventory" => Ok(Self::Inventory),
            "prices" => Ok(Self::Prices),
            "shopItems" | "shop_items" => Ok(Self::ShopItems),
            "beverages" => Ok(Self::Beverages),
            other => Err(Error::Import {
                message: format!("Unknown collection '{other}'"),
            }),
        }
    }
}

/// How many documents an import stored and how many it left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Documents stored
    pub imported: usize,
    /// Documents skipped as invalid
    pub skipped: usize,
}

fn text(doc: &Document, field: &str) -> Option<String> {
    doc.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

#[allow(clippy::cast_possible_truncation)]
fn quantity(doc: &Document, field: &str) -> i64 {
    match doc.get(field) {
        Some(Value::Number(number)) => number
            .as_i64()
            // Whole part of a fractional count
            .or_else(|| number.as_f64().map(|value| value.trunc() as i64))
            .unwrap_or(0)
            .clamp(0, MAX_QUANTITY),
        Some(Value::String(raw)) => parse_quantity(raw),
        _ => 0,
    }
}

fn amount(doc: &Document, field: &str) -> Option<Decimal> {
    match doc.get(field)? {
        Value::Number(number) => Decimal::from_str(&number.to_string()).ok(),
        Value::String(raw) => Decimal::from_str(raw.trim()).ok(),
        _ => None,
    }
}

fn date(doc: &Document) -> Option<NaiveDate> {
    text(doc, "date").and_then(|raw| parse_date(&raw).ok())
}

fn daily_key(doc: &Document) -> Option<EntryKey> {
    Some(EntryKey::new(
        text(doc, "shop")?,
        date(doc)?,
        text(doc, "itemName")?,
    ))
}

fn inventory_record(doc: &Document, now: NaiveDateTime) -> EntryRecord {
    let flows = FlowField::ALL
        .iter()
        .fold(FlowFields::default(), |flows, field| {
            flows.with(*field, quantity(doc, field.as_str()))
        });
    EntryRecord {
        flows,
        figures: compute_figures(quantity(doc, "previousDayRemaining"), &flows),
        timestamp: now,
    }
}

/// Stores one document. `Ok(false)` means the document was invalid.
async fn import_document(
    db: &DatabaseConnection,
    collection: Collection,
    doc: &Document,
    now: NaiveDateTime,
) -> Result<bool> {
    match collection {
        Collection::Inventory => {
            let Some(key) = daily_key(doc) else {
                return Ok(false);
            };
            insert_entry(db, &key, &inventory_record(doc, now)).await?;
        }
        Collection::Beverages => {
            let Some(key) = daily_key(doc) else {
                return Ok(false);
            };
            upsert_beverage_count(db, &key, quantity(doc, "todayCount"), now).await?;
        }
        Collection::Prices => {
            let (Some(shop), Some(item_name), Some(price)) =
                (text(doc, "shop"), text(doc, "itemName"), amount(doc, "price"))
            else {
                return Ok(false);
            };
            upsert_price(db, &shop, &item_name, price, now).await?;
        }
        Collection::ShopItems => {
            let (Some(shop), Some(item_name)) = (text(doc, "shop"), text(doc, "itemName")) else {
                return Ok(false);
            };
            let order = quantity(doc, "order");
            match get_shop_item(db, &shop, &item_name).await? {
                Some(existing) => {
                    update_shop_item_order(db, existing.id, order, now).await?;
                }
                None => {
                    insert_shop_item(db, &shop, &item_name, order, now).await?;
                }
            }
        }
    }
    Ok(true)
}

/// Imports a JSON array of documents into `collection`.
///
/// Invalid documents, and documents the store rejects (for example a
/// negative price), are skipped with a warning; the rest are upserted by
/// natural key.
///
/// # Errors
/// Returns an error if the text is not a JSON array.
#[instrument(skip(db, json))]
pub async fn import_documents(
    db: &DatabaseConnection,
    collection: Collection,
    json: &str,
) -> Result<ImportSummary> {
    let documents: Vec<Value> = serde_json::from_str(json)?;
    let now = chrono::Utc::now().naive_utc();
    let mut summary = ImportSummary::default();

    for (position, document) in documents.iter().enumerate() {
        let Some(doc) = document.as_object() else {
            warn!("Skipping {} document #{}: not an object", collection, position);
            summary.skipped += 1;
            continue;
        };
        match import_document(db, collection, doc, now).await {
            Ok(true) => summary.imported += 1,
            Ok(false) => {
                warn!(
                    "Skipping {} document #{}: missing shop, item name or date",
                    collection, position
                );
                summary.skipped += 1;
            }
            Err(e) => {
                warn!("Skipping {} document #{}: {}", collection, position, e);
                summary.skipped += 1;
            }
        }
    }

    info!(
        "Imported {} {} document(s), skipped {}",
        summary.imported, collection, summary.skipped
    );
    Ok(summary)
}

/// Reads a JSON export from disk and imports it.
pub async fn import_file<P: AsRef<Path>>(
    db: &DatabaseConnection,
    collection: Collection,
    path: P,
) -> Result<ImportSummary> {
    let json = std::fs::read_to_string(path.as_ref())?;
    import_documents(db, collection, &json).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        beverage::list_all_beverage_entries, catalog::list_shop_catalog,
        inventory::list_all_entries, price::get_price,
    };
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_collection_from_str() {
        assert_eq!("shopItems".parse::<Collection>().unwrap(), Collection::ShopItems);
        assert_eq!("prices".parse::<Collection>().unwrap(), Collection::Prices);
        assert!(matches!(
            "orders".parse::<Collection>(),
            Err(Error::Import { .. })
        ));
    }

    #[tokio::test]
    async fn test_import_inventory_is_lenient() -> Result<()> {
        let db = setup_test_db().await?;
        let json = r#"[
            {"shop": "Koswatta", "itemName": "Tea bun", "date": "2025-03-10",
             "morningTime": "50", "remainingInventory": 10, "previousDayRemaining": 20,
             "discard": "abc"},
            {"shop": "Koswatta", "itemName": "Fish bun", "date": "2025-03-10"},
            {"shop": "Koswatta", "date": "2025-03-10", "morningTime": 5},
            {"shop": "Koswatta", "itemName": "Jam bun", "date": "10/03/2025"},
            42
        ]"#;

        let summary = import_documents(&db, Collection::Inventory, json).await?;
        assert_eq!(summary, ImportSummary { imported: 2, skipped: 3 });

        let entries = list_all_entries(&db).await?;
        let tea = entries.iter().find(|e| e.item_name == "Tea bun").unwrap();
        assert_eq!(tea.morning_time, 50);
        assert_eq!(tea.discard, 0);
        assert_eq!(tea.starting_inventory, 70);
        assert_eq!(tea.selling, 60);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_caps_huge_quantities() -> Result<()> {
        let db = setup_test_db().await?;
        let json = r#"[
            {"shop": "Koswatta", "itemName": "Tea bun", "date": "2025-03-10",
             "morningTime": 9223372036854775807, "eveningTime": "9223372036854775807"}
        ]"#;
        import_documents(&db, Collection::Inventory, json).await?;

        let entries = list_all_entries(&db).await?;
        assert_eq!(entries[0].morning_time, MAX_QUANTITY);
        assert_eq!(entries[0].evening_time, MAX_QUANTITY);
        assert_eq!(entries[0].selling, 2 * MAX_QUANTITY);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_is_an_upsert() -> Result<()> {
        let db = setup_test_db().await?;
        let first = r#"[{"shop": "Koswatta", "itemName": "Nescafe", "date": "2025-03-10", "todayCount": 100}]"#;
        let second = r#"[{"shop": "Koswatta", "itemName": "Nescafe", "date": "2025-03-10", "todayCount": "120"}]"#;
        import_documents(&db, Collection::Beverages, first).await?;
        import_documents(&db, Collection::Beverages, second).await?;

        let readings = list_all_beverage_entries(&db).await?;
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].today_count, 120);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_prices_and_catalog() -> Result<()> {
        let db = setup_test_db().await?;
        let prices = r#"[
            {"shop": "Koswatta", "itemName": "Tea bun", "price": 45.5},
            {"shop": "Koswatta", "itemName": "Fish bun", "price": "80"},
            {"shop": "Koswatta", "itemName": "Wade", "price": -3},
            {"shop": "Koswatta", "itemName": "Jam bun"}
        ]"#;
        let summary = import_documents(&db, Collection::Prices, prices).await?;
        assert_eq!(summary, ImportSummary { imported: 2, skipped: 2 });
        let tea = get_price(&db, "Koswatta", "Tea bun").await?.unwrap();
        assert_eq!(tea.price, dec!(45.5));

        let items = r#"[
            {"shop": "Koswatta", "itemName": "Tea bun", "order": 2},
            {"shop": "Koswatta", "itemName": "Fish bun", "order": "1"}
        ]"#;
        import_documents(&db, Collection::ShopItems, items).await?;
        let catalog = list_shop_catalog(&db, "Koswatta").await?;
        let names: Vec<&str> = catalog.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, vec!["Fish bun", "Tea bun"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_rejects_non_array() -> Result<()> {
        let db = setup_test_db().await?;
        let result = import_documents(&db, Collection::Prices, "{\"a\": 1}").await;
        assert!(matches!(result, Err(Error::Json(_))));
        Ok(())
    }
}
