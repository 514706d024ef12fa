//! Beverage sales from cumulative machine counters.
//!
//! Each beverage machine shows a running total. The day's sales are today's
//! reading minus the previous day's, never negative.

use crate::{
    core::{
        flows::parse_quantity,
        index::{BeverageIndex, EntryKey},
        price::PriceIndex,
    },
    entities::{BeverageEntry, beverage_entry},
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, instrument};

/// The computed view of one beverage on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeverageRow {
    /// Shop, day and beverage the row describes
    pub key: EntryKey,
    /// Id of the stored reading, if any
    pub entry_id: Option<i64>,
    /// Counter reading of the previous day, 0 without one
    pub previous_day_count: i64,
    /// Counter reading of the day, 0 without one
    pub today_count: i64,
    /// `max(0, today_count - previous_day_count)`
    pub selling: i64,
    /// Unit price at the shop
    pub price: Option<Decimal>,
    /// `selling × price`, `None` without a price
    pub total_value: Option<Decimal>,
    /// Whether the beverage has no price at the shop
    pub has_price_missing: bool,
}

impl BeverageRow {
    /// Whether the row belongs in the missing-price warning
    #[must_use]
    pub const fn needs_price_warning(&self) -> bool {
        self.has_price_missing && self.today_count > 0
    }
}

/// All beverage rows of one shop on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeverageSheet {
    /// One row per configured beverage
    pub rows: Vec<BeverageRow>,
    /// Beverages with a reading but no price
    pub missing_prices: Vec<String>,
}

/// Derives the beverage rows of `shop` on `date`, one per name in `beverages`.
#[must_use]
pub fn derive_beverages<S: AsRef<str>>(
    beverages: &[S],
    shop: &str,
    date: NaiveDate,
    readings: &BeverageIndex,
    prices: &PriceIndex,
) -> BeverageSheet {
    let rows: Vec<BeverageRow> = beverages
        .iter()
        .map(|name| {
            let key = EntryKey::new(shop, date, name.as_ref());
            let previous_day_count = readings.previous_day_count(&key);
            let today_count = readings.today_count(&key);
            let selling = (today_count - previous_day_count).max(0);
            let price = prices.price_of(shop, name.as_ref());
            BeverageRow {
                entry_id: readings.get(&key).map(|entry| entry.id),
                previous_day_count,
                today_count,
                selling,
                price,
                total_value: price.and_then(|unit| Decimal::from(selling).checked_mul(unit)),
                has_price_missing: price.is_none(),
                key,
            }
        })
        .collect();
    let missing_prices = rows
        .iter()
        .filter(|row| row.needs_price_warning())
        .map(|row| row.key.item_name.clone())
        .collect();
    BeverageSheet {
        rows,
        missing_prices,
    }
}

/// Retrieves every beverage reading, oldest day first.
pub async fn list_all_beverage_entries(
    db: &DatabaseConnection,
) -> Result<Vec<beverage_entry::Model>> {
    BeverageEntry::find()
        .order_by_asc(beverage_entry::Column::Date)
        .order_by_asc(beverage_entry::Column::Shop)
        .order_by_asc(beverage_entry::Column::ItemName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds the reading stored under a natural key.
pub async fn get_beverage_entry<C>(db: &C, key: &EntryKey) -> Result<Option<beverage_entry::Model>>
where
    C: ConnectionTrait,
{
    BeverageEntry::find()
        .filter(beverage_entry::Column::Date.eq(key.date))
        .filter(beverage_entry::Column::Shop.eq(key.shop.as_str()))
        .filter(beverage_entry::Column::ItemName.eq(key.item_name.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Stores a counter reading, replacing the day's reading if there is one.
///
/// # Errors
/// Returns an error if the beverage name is empty or the database
/// operation fails.
#[instrument(skip(db))]
pub async fn upsert_beverage_count(
    db: &DatabaseConnection,
    key: &EntryKey,
    today_count: i64,
    now: NaiveDateTime,
) -> Result<beverage_entry::Model> {
    if key.item_name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Beverage name cannot be empty".to_string(),
        });
    }
    let today_count = today_count.max(0);

    let txn = db.begin().await?;
    let saved = if let Some(existing) = get_beverage_entry(&txn, key).await? {
        let mut entry: beverage_entry::ActiveModel = existing.into();
        entry.today_count = Set(today_count);
        entry.updated_at = Set(now);
        entry.update(&txn).await?
    } else {
        beverage_entry::ActiveModel {
            date: Set(key.date),
            shop: Set(key.shop.clone()),
            item_name: Set(key.item_name.clone()),
            today_count: Set(today_count),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?
    };
    txn.commit().await?;

    debug!("Recorded counter {} for {}", today_count, key);
    Ok(saved)
}

/// Records a typed counter reading. Input is parsed like inventory
/// quantities, so bad input stores 0.
pub async fn record_beverage_count(
    db: &DatabaseConnection,
    shop: &str,
    date: NaiveDate,
    item_name: &str,
    raw: &str,
    now: NaiveDateTime,
) -> Result<beverage_entry::Model> {
    let key = EntryKey::new(shop, date, item_name);
    upsert_beverage_count(db, &key, parse_quantity(raw), now).await
}

/// Changes the counter of an existing reading.
pub async fn update_beverage_by_id(
    db: &DatabaseConnection,
    entry_id: i64,
    today_count: i64,
    now: NaiveDateTime,
) -> Result<beverage_entry::Model> {
    let mut entry: beverage_entry::ActiveModel = BeverageEntry::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("beverage entry {entry_id}")))?
        .into();
    entry.today_count = Set(today_count.max(0));
    entry.updated_at = Set(now);
    entry.update(db).await.map_err(Into::into)
}

/// Removes a reading by id. Returns the number of deleted rows.
pub async fn delete_beverage_by_id(db: &DatabaseConnection, entry_id: i64) -> Result<u64> {
    let result = BeverageEntry::delete_by_id(entry_id).exec(db).await?;
    Ok(result.rows_affected)
}
