//! Inventory entry persistence - turning drafts into stored entries.
//!
//! Entries are keyed by (date, shop, item). An [`UpsertCommand::Insert`]
//! resolves through find-or-create on that key inside a transaction, so a
//! draft that was built before someone else saved the same item-day updates
//! the existing entry instead of creating a second one.

use crate::{
    core::{
        edits::{EditSession, EntryRecord, UpsertCommand},
        index::EntryKey,
        save::{FailedWrite, SaveReport},
    },
    entities::{InventoryEntry, inventory_entry},
    errors::Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument, warn};

/// Retrieves every inventory entry, oldest day first.
pub async fn list_all_entries(db: &DatabaseConnection) -> Result<Vec<inventory_entry::Model>> {
    InventoryEntry::find()
        .order_by_asc(inventory_entry::Column::Date)
        .order_by_asc(inventory_entry::Column::Shop)
        .order_by_asc(inventory_entry::Column::ItemName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the entries of one shop on one day.
pub async fn list_entries_for(
    db: &DatabaseConnection,
    shop: &str,
    date: NaiveDate,
) -> Result<Vec<inventory_entry::Model>> {
    InventoryEntry::find()
        .filter(inventory_entry::Column::Shop.eq(shop))
        .filter(inventory_entry::Column::Date.eq(date))
        .order_by_asc(inventory_entry::Column::ItemName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds the entry stored under a natural key.
pub async fn get_entry_by_key<C>(db: &C, key: &EntryKey) -> Result<Option<inventory_entry::Model>>
where
    C: ConnectionTrait,
{
    InventoryEntry::find()
        .filter(inventory_entry::Column::Date.eq(key.date))
        .filter(inventory_entry::Column::Shop.eq(key.shop.as_str()))
        .filter(inventory_entry::Column::ItemName.eq(key.item_name.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

fn write_record(entry: &mut inventory_entry::ActiveModel, record: &EntryRecord) {
    let flows = &record.flows;
    entry.morning_time = Set(flows.morning_time);
    entry.evening_time = Set(flows.evening_time);
    entry.extra_in = Set(flows.extra_in);
    entry.transfer_out = Set(flows.transfer_out);
    entry.discard = Set(flows.discard);
    entry.remaining_inventory = Set(flows.remaining_inventory);
    entry.previous_day_remaining = Set(record.figures.previous_day_remaining);
    entry.starting_inventory = Set(record.figures.starting_inventory);
    entry.selling = Set(record.figures.selling);
    entry.updated_at = Set(record.timestamp);
}

/// Stores the entry for `key`, updating it if one already exists.
///
/// The lookup and the write run in one transaction.
///
/// # Errors
/// Returns an error if the database operation fails.
#[instrument(skip(db, record))]
pub async fn insert_entry(
    db: &DatabaseConnection,
    key: &EntryKey,
    record: &EntryRecord,
) -> Result<inventory_entry::Model> {
    let txn = db.begin().await?;
    let saved = if let Some(existing) = get_entry_by_key(&txn, key).await? {
        debug!("Entry for {} already exists, updating id {}", key, existing.id);
        let mut entry: inventory_entry::ActiveModel = existing.into();
        write_record(&mut entry, record);
        entry.update(&txn).await?
    } else {
        let mut entry = inventory_entry::ActiveModel {
            date: Set(key.date),
            shop: Set(key.shop.clone()),
            item_name: Set(key.item_name.clone()),
            created_at: Set(record.timestamp),
            ..Default::default()
        };
        write_record(&mut entry, record);
        entry.insert(&txn).await?
    };
    txn.commit().await?;
    Ok(saved)
}

/// Overwrites the entry with `entry_id`.
///
/// # Errors
/// Returns [`DbErr::RecordNotFound`] (wrapped) if the entry no longer exists.
pub async fn update_entry_by_id(
    db: &DatabaseConnection,
    entry_id: i64,
    record: &EntryRecord,
) -> Result<inventory_entry::Model> {
    let mut entry: inventory_entry::ActiveModel = InventoryEntry::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("inventory entry {entry_id}")))?
        .into();
    write_record(&mut entry, record);
    entry.update(db).await.map_err(Into::into)
}

/// Removes an entry by id. Returns the number of deleted rows.
pub async fn delete_entry_by_id(db: &DatabaseConnection, entry_id: i64) -> Result<u64> {
    let result = InventoryEntry::delete_by_id(entry_id).exec(db).await?;
    Ok(result.rows_affected)
}

/// Issues one save command.
pub async fn apply_upsert(
    db: &DatabaseConnection,
    command: &UpsertCommand,
) -> Result<inventory_entry::Model> {
    match command {
        UpsertCommand::Update { id, record, .. } => update_entry_by_id(db, *id, record).await,
        UpsertCommand::Insert { key, record } => insert_entry(db, key, record).await,
    }
}

/// Saves every dirty draft of the session concurrently.
///
/// Each item-day is reported on its own. Saved and skipped keys leave the
/// session; failed ones keep their drafts so a retry re-sends only those.
pub async fn save_edits(
    db: &DatabaseConnection,
    session: &mut EditSession,
    now: NaiveDateTime,
) -> SaveReport<EntryKey> {
    let plan = session.plan_save(now);
    if !plan.skipped.is_empty() {
        debug!("Skipping {} all-zero new row(s)", plan.skipped.len());
    }

    let writes = plan.commands.iter().map(|command| async move {
        let outcome = apply_upsert(db, command).await;
        (command.key().clone(), outcome)
    });
    let outcomes = futures::future::join_all(writes).await;

    let mut report = SaveReport {
        skipped: plan.skipped,
        ..SaveReport::default()
    };
    for (key, outcome) in outcomes {
        match outcome {
            Ok(_) => report.saved.push(key),
            Err(e) => {
                warn!("Failed to save entry {}: {}", key, e);
                report.failed.push(FailedWrite {
                    key,
                    reason: e.user_message(),
                });
            }
        }
    }
    session.settle(&report);

    info!(
        "Inventory save finished: {} saved, {} failed, {} skipped",
        report.saved.len(),
        report.failed.len(),
        report.skipped.len()
    );
    report
}
