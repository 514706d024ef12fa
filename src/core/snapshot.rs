//! A consistent in-memory copy of every collection.
//!
//! All derivations read from a [`Snapshot`]. It is rebuilt from the store
//! after every write, so rows are always recomputed from what was persisted.

use crate::{
    core::{
        beverage::list_all_beverage_entries,
        catalog::list_all_shop_items,
        index::{BeverageIndex, EntryIndex},
        inventory::list_all_entries,
        price::{PriceIndex, list_all_prices},
    },
    entities::{beverage_entry, inventory_entry, price, shop_item},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Every collection, indexed for the derivations.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Catalog items of all shops
    pub catalog: Vec<shop_item::Model>,
    /// Inventory entries by (shop, date, item)
    pub entries: EntryIndex,
    /// Prices by shop and item
    pub prices: PriceIndex,
    /// Beverage counter readings by (shop, date, item)
    pub beverages: BeverageIndex,
}

impl Snapshot {
    /// Builds the indexes over freshly loaded collections.
    #[must_use]
    pub fn new(
        catalog: Vec<shop_item::Model>,
        entries: Vec<inventory_entry::Model>,
        prices: Vec<price::Model>,
        beverages: Vec<beverage_entry::Model>,
    ) -> Self {
        Self {
            catalog,
            entries: EntryIndex::build(entries),
            prices: PriceIndex::build(prices),
            beverages: BeverageIndex::build(beverages),
        }
    }

    /// Catalog of one shop, by order then id.
    #[must_use]
    pub fn catalog_for(&self, shop: &str) -> Vec<&shop_item::Model> {
        let mut items: Vec<&shop_item::Model> =
            self.catalog.iter().filter(|item| item.shop == shop).collect();
        items.sort_by_key(|item| (item.order, item.id));
        items
    }

    /// Item names of one shop, in catalog order.
    #[must_use]
    pub fn item_names(&self, shop: &str) -> Vec<String> {
        self.catalog_for(shop)
            .into_iter()
            .map(|item| item.item_name.clone())
            .collect()
    }

    /// Shops that have at least one catalog item, sorted by name.
    #[must_use]
    pub fn shops(&self) -> Vec<&str> {
        self.catalog
            .iter()
            .map(|item| item.shop.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Loads every collection concurrently.
#[instrument(skip(db))]
pub async fn fetch_snapshot(db: &DatabaseConnection) -> Result<Snapshot> {
    let (catalog, entries, prices, beverages) = tokio::try_join!(
        list_all_shop_items(db),
        list_all_entries(db),
        list_all_prices(db),
        list_all_beverage_entries(db),
    )?;
    debug!(
        "Fetched {} catalog items, {} entries, {} prices, {} beverage readings",
        catalog.len(),
        entries.len(),
        prices.len(),
        beverages.len()
    );
    Ok(Snapshot::new(catalog, entries, prices, beverages))
}
