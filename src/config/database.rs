//! Database configuration module for the bakery ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`; the natural keys of each collection get a
//! composite unique index so a duplicate (shop, item) or (date, shop, item) can
//! never be persisted, even by a stale insert.

use crate::entities::{
    BeverageEntry, InventoryEntry, Price, ShopItem, beverage_entry, inventory_entry, price,
    shop_item,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table_for<E, C>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_shop_items_shop_item")
            .table(ShopItem)
            .col(shop_item::Column::Shop)
            .col(shop_item::Column::ItemName)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_prices_item_shop")
            .table(Price)
            .col(price::Column::ItemName)
            .col(price::Column::Shop)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_inventory_date_shop_item")
            .table(InventoryEntry)
            .col(inventory_entry::Column::Date)
            .col(inventory_entry::Column::Shop)
            .col(inventory_entry::Column::ItemName)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_beverages_date_shop_item")
            .table(BeverageEntry)
            .col(beverage_entry::Column::Date)
            .col(beverage_entry::Column::Shop)
            .col(beverage_entry::Column::ItemName)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}

/// Creates all tables and unique indexes if they do not exist yet.
///
/// Safe to call on every start-up.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table_for(db, &schema, ShopItem).await?;
    create_table_for(db, &schema, Price).await?;
    create_table_for(db, &schema, InventoryEntry).await?;
    create_table_for(db, &schema, BeverageEntry).await?;

    for index in unique_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    info!("Database tables ensured");
    Ok(())
}

/// Directory that must exist before `SQLite` can create the file behind
/// `database_url`. `None` for in-memory and non-`SQLite` URLs.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Connects and prepares the schema in one step.
pub async fn init_database(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(dir) = sqlite_parent_dir(database_url) {
        std::fs::create_dir_all(dir)?;
    }
    let db = create_connection(database_url).await?;
    create_tables(&db).await?;
    Ok(db)
}
