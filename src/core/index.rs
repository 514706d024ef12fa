//! Day-keyed indexes over daily records.
//!
//! Inventory entries and beverage readings are both keyed by
//! (shop, date, item name). [`DayIndex`] holds one collection in a hash map
//! under that key so that finding the previous day is a single hash lookup
//! instead of a scan over the whole history.

use crate::entities::{beverage_entry, inventory_entry};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Natural key of a daily record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    /// Shop the record belongs to
    pub shop: String,
    /// Business day
    pub date: NaiveDate,
    /// Item the record belongs to
    pub item_name: String,
}

impl EntryKey {
    /// Builds a key from its parts.
    pub fn new(shop: impl Into<String>, date: NaiveDate, item_name: impl Into<String>) -> Self {
        Self {
            shop: shop.into(),
            date,
            item_name: item_name.into(),
        }
    }

    /// The same shop and item one calendar day earlier.
    ///
    /// Returns `None` only at the lower bound of the calendar.
    #[must_use]
    pub fn previous_day(&self) -> Option<Self> {
        self.date.pred_opt().map(|date| Self {
            shop: self.shop.clone(),
            date,
            item_name: self.item_name.clone(),
        })
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.shop, self.date, self.item_name)
    }
}

/// A record stored once per shop, day and item.
pub trait DailyRecord {
    /// Shop the record belongs to
    fn shop(&self) -> &str;
    /// Item the record belongs to
    fn item_name(&self) -> &str;
    /// Business day of the record
    fn date(&self) -> NaiveDate;

    /// Natural key of the record
    fn key(&self) -> EntryKey {
        EntryKey::new(self.shop(), self.date(), self.item_name())
    }
}

impl DailyRecord for inventory_entry::Model {
    fn shop(&self) -> &str {
        &self.shop
    }

    fn item_name(&self) -> &str {
        &self.item_name
    }

    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl DailyRecord for beverage_entry::Model {
    fn shop(&self) -> &str {
        &self.shop
    }

    fn item_name(&self) -> &str {
        &self.item_name
    }

    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Daily records indexed by (shop, date, item name).
#[derive(Debug, Clone)]
pub struct DayIndex<T> {
    records: HashMap<EntryKey, T>,
}

/// Index over inventory entries
pub type EntryIndex = DayIndex<inventory_entry::Model>;

/// Index over beverage counter readings
pub type BeverageIndex = DayIndex<beverage_entry::Model>;

impl<T> Default for DayIndex<T> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

impl<T: DailyRecord> DayIndex<T> {
    /// Builds the index. If the input holds two records for one key, the
    /// first one is kept.
    pub fn build(records: impl IntoIterator<Item = T>) -> Self {
        let mut index = HashMap::new();
        for record in records {
            index.entry(record.key()).or_insert(record);
        }
        Self { records: index }
    }

    /// Record stored under `key`
    #[must_use]
    pub fn get(&self, key: &EntryKey) -> Option<&T> {
        self.records.get(key)
    }

    /// Record for the same shop and item on the day before `key`
    #[must_use]
    pub fn previous_day(&self, key: &EntryKey) -> Option<&T> {
        key.previous_day().and_then(|prev| self.records.get(&prev))
    }

    /// Earliest day with a record for `shop` and `item_name`.
    #[must_use]
    pub fn first_recorded_date(&self, shop: &str, item_name: &str) -> Option<NaiveDate> {
        self.records
            .keys()
            .filter(|key| key.shop == shop && key.item_name == item_name)
            .map(|key| key.date)
            .min()
    }

    /// True when the item has history before `key.date` but nothing on the
    /// day immediately before it, i.e. a day was skipped.
    ///
    /// The derived figures treat both this case and "first day ever" as zero
    /// carried-over stock; this lets a caller warn about the former.
    #[must_use]
    pub fn has_gap_before(&self, key: &EntryKey) -> bool {
        if self.previous_day(key).is_some() {
            return false;
        }
        self.first_recorded_date(&key.shop, &key.item_name)
            .is_some_and(|first| first < key.date)
    }

    /// Records of one shop and day, in no particular order
    pub fn for_shop_and_date<'a>(
        &'a self,
        shop: &'a str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a T> + 'a {
        self.records
            .iter()
            .filter(move |(key, _)| key.shop == shop && key.date == date)
            .map(|(_, record)| record)
    }

    /// Number of indexed records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All indexed records
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }
}

impl EntryIndex {
    /// Remaining stock carried over from the previous day, 0 when the
    /// previous day has no entry.
    #[must_use]
    pub fn previous_day_remaining(&self, key: &EntryKey) -> i64 {
        self.previous_day(key)
            .map_or(0, |entry| entry.remaining_inventory)
    }
}

impl BeverageIndex {
    /// Counter reading of the previous day, 0 when there is none.
    #[must_use]
    pub fn previous_day_count(&self, key: &EntryKey) -> i64 {
        self.previous_day(key).map_or(0, |entry| entry.today_count)
    }

    /// Counter reading stored for `key`, 0 when there is none.
    #[must_use]
    pub fn today_count(&self, key: &EntryKey) -> i64 {
        self.get(key).map_or(0, |entry| entry.today_count)
    }
}
