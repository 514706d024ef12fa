//! Shared test utilities for the bakery ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults. The `*_model` builders
//! make in-memory models for the pure derivations; the `insert_test_*`
//! helpers write through the store.
#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        catalog::insert_shop_item,
        edits::EntryRecord,
        flows::{FlowFields, compute_figures},
        index::EntryKey,
        inventory::insert_entry,
    },
    entities::{beverage_entry, inventory_entry, price, shop_item},
    errors::Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Calendar date shorthand
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Fixed timestamp used for `created_at`/`updated_at` in tests
pub fn test_now() -> NaiveDateTime {
    date(2025, 3, 10).and_hms_opt(18, 30, 0).unwrap()
}

/// Catalog item model.
pub fn shop_item_model(id: i64, shop: &str, item_name: &str, order: i64) -> shop_item::Model {
    shop_item::Model {
        id,
        shop: shop.to_string(),
        item_name: item_name.to_string(),
        order,
        created_at: test_now(),
        updated_at: test_now(),
    }
}

/// Inventory entry model with only `remaining_inventory` set.
///
/// # Defaults
/// * every other flow field: 0
/// * derived figures: computed with no carried-over stock
pub fn entry_model(
    id: i64,
    shop: &str,
    date: NaiveDate,
    item_name: &str,
    remaining_inventory: i64,
) -> inventory_entry::Model {
    inventory_entry::Model {
        id,
        date,
        shop: shop.to_string(),
        item_name: item_name.to_string(),
        morning_time: 0,
        evening_time: 0,
        extra_in: 0,
        transfer_out: 0,
        discard: 0,
        remaining_inventory,
        previous_day_remaining: 0,
        starting_inventory: 0,
        selling: 0,
        created_at: test_now(),
        updated_at: test_now(),
    }
}

/// Price record model.
pub fn price_model(id: i64, shop: &str, item_name: &str, value: Decimal) -> price::Model {
    price::Model {
        id,
        item_name: item_name.to_string(),
        shop: shop.to_string(),
        price: value,
        created_at: test_now(),
        updated_at: test_now(),
    }
}

/// Beverage counter reading model.
pub fn beverage_model(
    id: i64,
    shop: &str,
    date: NaiveDate,
    item_name: &str,
    today_count: i64,
) -> beverage_entry::Model {
    beverage_entry::Model {
        id,
        date,
        shop: shop.to_string(),
        item_name: item_name.to_string(),
        today_count,
        created_at: test_now(),
        updated_at: test_now(),
    }
}

/// Stores a catalog item.
pub async fn insert_test_shop_item(
    db: &DatabaseConnection,
    shop: &str,
    item_name: &str,
    order: i64,
) -> Result<shop_item::Model> {
    insert_shop_item(db, shop, item_name, order, test_now()).await
}

/// Stores an inventory entry with a morning delivery and a closing count.
/// Derived figures assume no carried-over stock.
pub async fn insert_test_entry(
    db: &DatabaseConnection,
    shop: &str,
    date: NaiveDate,
    item_name: &str,
    morning_time: i64,
    remaining_inventory: i64,
) -> Result<inventory_entry::Model> {
    let flows = FlowFields {
        morning_time,
        remaining_inventory,
        ..FlowFields::default()
    };
    let record = EntryRecord {
        flows,
        figures: compute_figures(0, &flows),
        timestamp: test_now(),
    };
    insert_entry(db, &EntryKey::new(shop, date, item_name), &record).await
}

/// Stores a beverage counter reading.
pub async fn insert_test_beverage(
    db: &DatabaseConnection,
    shop: &str,
    date: NaiveDate,
    item_name: &str,
    today_count: i64,
) -> Result<beverage_entry::Model> {
    beverage_entry::ActiveModel {
        date: Set(date),
        shop: Set(shop.to_string()),
        item_name: Set(item_name.to_string()),
        today_count: Set(today_count),
        created_at: Set(test_now()),
        updated_at: Set(test_now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
