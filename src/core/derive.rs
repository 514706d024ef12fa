//! Derived-row computation.
//!
//! Combines a shop's catalog, the day's inventory entries, the previous
//! day's remaining stock, the price list and any unsaved drafts into one
//! [`DerivedRow`] per catalog item. Everything here is a pure function of its
//! inputs; rows are recomputed whenever the inputs change and never stored.

use crate::{
    core::{
        edits::EditSession,
        flows::{Figures, FlowFields, compute_figures},
        index::{EntryIndex, EntryKey},
        price::PriceIndex,
        snapshot::Snapshot,
    },
    entities::shop_item,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// The computed view of one catalog item on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedRow {
    /// Shop, day and item the row describes
    pub key: EntryKey,
    /// Catalog position of the item
    pub order: i64,
    /// Id of the persisted entry, if one exists
    pub entry_id: Option<i64>,
    /// Whether an entry is persisted for this day
    pub is_existing: bool,
    /// Whether the flows come from an unsaved draft
    pub has_unsaved_edits: bool,
    /// Staff-entered quantities
    pub flows: FlowFields,
    /// Remaining stock of the previous day, 0 when that day has no entry
    pub previous_day_remaining: i64,
    /// `previous_day_remaining + morning + evening + extra_in`
    pub starting_inventory: i64,
    /// Sold quantity, clamped at 0; 0 until the day is counted
    pub selling: i64,
    /// Unit price at the shop, `None` when no price is recorded
    pub price: Option<Decimal>,
    /// `selling × price`, `None` without a price
    pub total_value: Option<Decimal>,
    /// Whether the item has no price at the shop
    pub has_price_missing: bool,
}

impl DerivedRow {
    /// Whether any flow field is greater than zero
    #[must_use]
    pub fn has_activity(&self) -> bool {
        self.flows.has_activity()
    }

    /// Whether the row belongs in the missing-price warning: it has stock
    /// movements but no price. Idle unpriced items are not warned about.
    #[must_use]
    pub fn needs_price_warning(&self) -> bool {
        self.has_price_missing && self.has_activity()
    }

    /// Item name shorthand
    #[must_use]
    pub fn item_name(&self) -> &str {
        &self.key.item_name
    }
}

/// All derived rows of one shop on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedSheet {
    /// Shop the sheet covers
    pub shop: String,
    /// Day the sheet covers
    pub date: NaiveDate,
    /// One row per catalog item, in catalog order
    pub rows: Vec<DerivedRow>,
    /// Items with activity but no price, in catalog order
    pub missing_prices: Vec<String>,
}

impl DerivedSheet {
    /// Row of the named item
    #[must_use]
    pub fn row(&self, item_name: &str) -> Option<&DerivedRow> {
        self.rows.iter().find(|row| row.key.item_name == item_name)
    }
}

/// Derives the row of one catalog item for `date`.
///
/// Flow fields come from the unsaved draft when there is one, else from the
/// persisted entry, else 0. An item with neither a draft nor an entry has not
/// been counted yet: its starting inventory is the carried-over stock and it
/// reports no sales.
#[must_use]
pub fn derive_row(
    item: &shop_item::Model,
    date: NaiveDate,
    entries: &EntryIndex,
    prices: &PriceIndex,
    edits: &EditSession,
) -> DerivedRow {
    let key = EntryKey::new(&item.shop, date, &item.item_name);
    let existing = entries.get(&key);
    let draft = edits.draft(&key);

    let flows = draft
        .map(|draft| draft.flows)
        .or_else(|| existing.map(FlowFields::from))
        .unwrap_or_default();
    let previous_day_remaining = entries.previous_day_remaining(&key);
    let figures = if existing.is_some() || draft.is_some() {
        compute_figures(previous_day_remaining, &flows)
    } else {
        // Nothing counted yet: the carried-over stock is available, none of it sold.
        Figures {
            previous_day_remaining,
            starting_inventory: previous_day_remaining,
            selling: 0,
        }
    };

    let price = prices.price_of(&item.shop, &item.item_name);
    let total_value = price.and_then(|unit| Decimal::from(figures.selling).checked_mul(unit));

    DerivedRow {
        order: item.order,
        entry_id: existing
            .map(|entry| entry.id)
            .or_else(|| draft.and_then(|draft| draft.id)),
        is_existing: existing.is_some(),
        has_unsaved_edits: draft.is_some(),
        flows,
        previous_day_remaining: figures.previous_day_remaining,
        starting_inventory: figures.starting_inventory,
        selling: figures.selling,
        price,
        total_value,
        has_price_missing: price.is_none(),
        key,
    }
}

/// Derives the sheet of `shop` on `date` from a snapshot and the unsaved
/// drafts. Items without any entry still get an all-zero row.
#[must_use]
pub fn derive_sheet(
    snapshot: &Snapshot,
    shop: &str,
    date: NaiveDate,
    edits: &EditSession,
) -> DerivedSheet {
    let rows: Vec<DerivedRow> = snapshot
        .catalog_for(shop)
        .into_iter()
        .map(|item| derive_row(item, date, &snapshot.entries, &snapshot.prices, edits))
        .collect();

    let missing_prices = rows
        .iter()
        .filter(|row| row.needs_price_warning())
        .map(|row| row.key.item_name.clone())
        .collect();

    DerivedSheet {
        shop: shop.to_string(),
        date,
        rows,
        missing_prices,
    }
}
