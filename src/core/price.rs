//! Price list business logic - per-shop unit prices.
//!
//! This module owns the `prices` collection: listing, find-or-create upserts,
//! deletion, the in-memory lookup index used by the derivations, the pending
//! price edits of the price management screen, and coverage statistics.
//! At most one price exists per (item, shop); inserts go through
//! find-or-create inside a transaction so that a second save for the same
//! key updates instead of duplicating.

use crate::{
    core::save::{FailedWrite, SaveReport},
    entities::{Price, price},
    errors::{Error, Result},
};
use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

/// Natural key of a price record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriceKey {
    /// Shop the price applies to
    pub shop: String,
    /// Item the price applies to
    pub item_name: String,
}

impl PriceKey {
    /// Builds a key from its parts.
    pub fn new(shop: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            shop: shop.into(),
            item_name: item_name.into(),
        }
    }
}

impl fmt::Display for PriceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.shop, self.item_name)
    }
}

/// Prices indexed by shop, then item name.
#[derive(Debug, Clone, Default)]
pub struct PriceIndex {
    by_shop: HashMap<String, HashMap<String, price::Model>>,
}

impl PriceIndex {
    /// Builds the index; the first record wins if a key appears twice.
    pub fn build(records: impl IntoIterator<Item = price::Model>) -> Self {
        let mut by_shop: HashMap<String, HashMap<String, price::Model>> = HashMap::new();
        for record in records {
            by_shop
                .entry(record.shop.clone())
                .or_default()
                .entry(record.item_name.clone())
                .or_insert(record);
        }
        Self { by_shop }
    }

    /// Full price record for an item at a shop
    #[must_use]
    pub fn record(&self, shop: &str, item_name: &str) -> Option<&price::Model> {
        self.by_shop.get(shop).and_then(|items| items.get(item_name))
    }

    /// Unit price for an item at a shop, exact match on both names
    #[must_use]
    pub fn price_of(&self, shop: &str, item_name: &str) -> Option<Decimal> {
        self.record(shop, item_name).map(|record| record.price)
    }

    /// Number of priced items across all shops
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_shop.values().map(HashMap::len).sum()
    }

    /// Whether no prices are known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Retrieves every price record, ordered by shop then item name.
pub async fn list_all_prices(db: &DatabaseConnection) -> Result<Vec<price::Model>> {
    Price::find()
        .order_by_asc(price::Column::Shop)
        .order_by_asc(price::Column::ItemName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds the price record of an item at a shop.
pub async fn get_price<C>(db: &C, shop: &str, item_name: &str) -> Result<Option<price::Model>>
where
    C: ConnectionTrait,
{
    Price::find()
        .filter(price::Column::Shop.eq(shop))
        .filter(price::Column::ItemName.eq(item_name))
        .one(db)
        .await
        .map_err(Into::into)
}

fn validate_price(value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::InvalidPrice {
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Sets the price of an item at a shop, creating the record if needed.
///
/// The lookup and the write run in one transaction.
///
/// # Errors
/// Returns an error if the price is negative, the item name is empty or the
/// database operation fails.
#[instrument(skip(db))]
pub async fn upsert_price(
    db: &DatabaseConnection,
    shop: &str,
    item_name: &str,
    value: Decimal,
    now: NaiveDateTime,
) -> Result<price::Model> {
    validate_price(value)?;
    if item_name.trim().is_empty() || shop.trim().is_empty() {
        return Err(Error::Validation {
            message: "Shop and item name are required for a price".to_string(),
        });
    }

    let txn = db.begin().await?;
    let saved = if let Some(existing) = get_price(&txn, shop, item_name).await? {
        let mut record: price::ActiveModel = existing.into();
        record.price = Set(value);
        record.updated_at = Set(now);
        record.update(&txn).await?
    } else {
        price::ActiveModel {
            item_name: Set(item_name.to_string()),
            shop: Set(shop.to_string()),
            price: Set(value),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?
    };
    txn.commit().await?;

    debug!("Saved price {} for {}/{}", value, shop, item_name);
    Ok(saved)
}

/// Changes the price of an existing record.
pub async fn update_price_by_id(
    db: &DatabaseConnection,
    price_id: i64,
    value: Decimal,
    now: NaiveDateTime,
) -> Result<price::Model> {
    validate_price(value)?;
    let mut record: price::ActiveModel = Price::find_by_id(price_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("price {price_id}")))?
        .into();
    record.price = Set(value);
    record.updated_at = Set(now);
    record.update(db).await.map_err(Into::into)
}

/// Removes a price record by id. Returns the number of deleted rows.
pub async fn delete_price_by_id(db: &DatabaseConnection, price_id: i64) -> Result<u64> {
    let result = Price::delete_by_id(price_id).exec(db).await?;
    Ok(result.rows_affected)
}

/// Removes the price of an item at a shop. Entries and catalog items that
/// refer to it are left untouched.
///
/// Returns `true` if a record was deleted.
#[instrument(skip(db))]
pub async fn delete_price(db: &DatabaseConnection, shop: &str, item_name: &str) -> Result<bool> {
    let Some(existing) = get_price(db, shop, item_name).await? else {
        return Ok(false);
    };
    let deleted = delete_price_by_id(db, existing.id).await? > 0;
    if deleted {
        info!("Deleted price for {}/{}", shop, item_name);
    }
    Ok(deleted)
}

/// Length of the decimal number at the start of `body`: digits, optionally
/// followed by a point and more digits.
fn leading_number_len(body: &str) -> usize {
    let whole = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    let fraction = body[whole..].strip_prefix('.').map_or(0, |rest| {
        rest.find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len())
    });
    if fraction > 0 { whole + 1 + fraction } else { whole }
}

/// Parses a typed price.
///
/// Like quantities, the leading number is used and trailing text ignored,
/// so `"12abc"` gives 12 and `"45.50 each"` gives 45.50. Returns `Ok(None)`
/// for empty, non-numeric or zero input (nothing to save), `Ok(Some(price))`
/// for a positive amount.
///
/// # Errors
/// Returns [`Error::InvalidPrice`] for a negative amount.
pub fn parse_price(raw: &str) -> Result<Option<Decimal>> {
    let trimmed = raw.trim();
    let negative = trimmed.starts_with('-');
    let body = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let number = &body[..leading_number_len(body)];
    if number.is_empty() {
        return Ok(None);
    }
    // ".5" has no whole part
    let Ok(magnitude) = Decimal::from_str(&format!("0{number}")) else {
        return Ok(None);
    };
    let value = if negative { -magnitude } else { magnitude };
    if value.is_zero() {
        return Ok(None);
    }
    validate_price(value)?;
    Ok(Some(value))
}

/// Unsaved price edits of the price management screen.
#[derive(Debug, Clone, Default)]
pub struct PriceEditSession {
    pending: BTreeMap<PriceKey, Decimal>,
}

impl PriceEditSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a typed price for an item.
    ///
    /// Empty, non-numeric or zero input drops any pending edit for the key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPrice`] for a negative amount; the pending
    /// edit is left unchanged.
    pub fn set_price(&mut self, shop: &str, item_name: &str, raw: &str) -> Result<()> {
        let key = PriceKey::new(shop, item_name);
        match parse_price(raw)? {
            Some(value) => {
                self.pending.insert(key, value);
            }
            None => {
                self.pending.remove(&key);
            }
        }
        Ok(())
    }

    /// Pending price for a key
    #[must_use]
    pub fn pending(&self, shop: &str, item_name: &str) -> Option<Decimal> {
        self.pending
            .get(&PriceKey::new(shop, item_name))
            .copied()
    }

    /// Number of unsaved edits
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether there is nothing to save
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending edits in key order
    pub fn iter(&self) -> impl Iterator<Item = (&PriceKey, &Decimal)> {
        self.pending.iter()
    }

    /// Drops every pending edit.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Saves every pending price edit concurrently.
///
/// Each edit is reported on its own. Saved edits leave the session, failed
/// ones stay pending so a retry only re-sends those.
pub async fn save_price_edits(
    db: &DatabaseConnection,
    session: &mut PriceEditSession,
    now: NaiveDateTime,
) -> SaveReport<PriceKey> {
    let pending: Vec<(PriceKey, Decimal)> = session
        .iter()
        .map(|(key, value)| (key.clone(), *value))
        .collect();
    let writes = pending.into_iter().map(|(key, value)| async move {
        let outcome = upsert_price(db, &key.shop, &key.item_name, value, now).await;
        (key, outcome)
    });
    let outcomes = futures::future::join_all(writes).await;

    let mut report = SaveReport::default();
    for (key, outcome) in outcomes {
        match outcome {
            Ok(_) => {
                session.pending.remove(&key);
                report.saved.push(key);
            }
            Err(e) => {
                warn!("Failed to save price for {}: {}", key, e);
                report.failed.push(FailedWrite {
                    key,
                    reason: e.user_message(),
                });
            }
        }
    }
    info!(
        "Price save finished: {} saved, {} failed",
        report.saved.len(),
        report.failed.len()
    );
    report
}

/// How many of a shop's items have a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceCoverage {
    /// Items considered
    pub total_items: usize,
    /// Items with a price at the shop
    pub with_price: usize,
    /// Items without a price at the shop
    pub missing: usize,
    /// `with_price / total_items` as a whole percentage, 0 for no items
    pub coverage_percent: u32,
}

/// Computes price coverage of `items` at `shop`.
#[must_use]
pub fn price_coverage<S: AsRef<str>>(items: &[S], shop: &str, prices: &PriceIndex) -> PriceCoverage {
    let total_items = items.len();
    let with_price = items
        .iter()
        .filter(|item| prices.price_of(shop, item.as_ref()).is_some())
        .count();
    let coverage_percent = if total_items == 0 {
        0
    } else {
        let ratio = Decimal::from(with_price) * Decimal::ONE_HUNDRED / Decimal::from(total_items);
        ratio
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0)
    };
    PriceCoverage {
        total_items,
        with_price,
        missing: total_items - with_price,
        coverage_percent,
    }
}

/// Case-insensitive substring filter over item names. An empty query keeps
/// every item.
#[must_use]
pub fn search_items<'a, S: AsRef<str>>(items: &'a [S], query: &str) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();
    items
        .iter()
        .map(AsRef::as_ref)
        .filter(|item| item.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("45").unwrap(), Some(dec!(45)));
        assert_eq!(parse_price(" 45.50 ").unwrap(), Some(dec!(45.50)));
        assert_eq!(parse_price("").unwrap(), None);
        assert_eq!(parse_price("abc").unwrap(), None);
        assert_eq!(parse_price("0").unwrap(), None);
        assert_eq!(parse_price("-").unwrap(), None);
        assert!(matches!(
            parse_price("-5"),
            Err(Error::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_parse_price_uses_leading_number() {
        assert_eq!(parse_price("12abc").unwrap(), Some(dec!(12)));
        assert_eq!(parse_price("45.50 each").unwrap(), Some(dec!(45.50)));
        assert_eq!(parse_price("12.5.3").unwrap(), Some(dec!(12.5)));
        assert_eq!(parse_price("12.").unwrap(), Some(dec!(12)));
        assert_eq!(parse_price(".5").unwrap(), Some(dec!(0.5)));
        assert_eq!(parse_price("+8").unwrap(), Some(dec!(8)));
        assert_eq!(parse_price("0abc").unwrap(), None);
        assert!(matches!(
            parse_price("-5kg"),
            Err(Error::InvalidPrice { .. })
        ));

        let mut session = PriceEditSession::new();
        session.set_price("Koswatta", "Tea bun", "12abc").unwrap();
        assert_eq!(session.pending("Koswatta", "Tea bun"), Some(dec!(12)));
    }

    #[test]
    fn test_price_session_zero_removes_edit() {
        let mut session = PriceEditSession::new();
        session.set_price("Koswatta", "Tea bun", "45").unwrap();
        assert_eq!(session.pending("Koswatta", "Tea bun"), Some(dec!(45)));
        assert_eq!(session.len(), 1);

        session.set_price("Koswatta", "Tea bun", "0").unwrap();
        assert!(session.is_empty());

        session.set_price("Koswatta", "Tea bun", "50").unwrap();
        session.set_price("Koswatta", "Tea bun", "").unwrap();
        assert!(session.is_empty());
    }

    #[test]
    fn test_price_session_negative_keeps_previous_edit() {
        let mut session = PriceEditSession::new();
        session.set_price("Koswatta", "Tea bun", "45").unwrap();
        assert!(session.set_price("Koswatta", "Tea bun", "-1").is_err());
        assert_eq!(session.pending("Koswatta", "Tea bun"), Some(dec!(45)));
    }

    #[test]
    fn test_price_index_exact_match() {
        let index = PriceIndex::build(vec![
            price_model(1, "Koswatta", "Tea bun", dec!(45)),
            price_model(2, "Arawwala", "Tea bun", dec!(50)),
        ]);
        assert_eq!(index.price_of("Koswatta", "Tea bun"), Some(dec!(45)));
        assert_eq!(index.price_of("Arawwala", "Tea bun"), Some(dec!(50)));
        assert_eq!(index.price_of("Koswatta", "tea bun"), None);
        assert_eq!(index.price_of("Depanama", "Tea bun"), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_price_coverage() {
        let index = PriceIndex::build(vec![
            price_model(1, "Koswatta", "Tea bun", dec!(45)),
            price_model(2, "Koswatta", "Fish bun", dec!(80)),
        ]);
        let items = ["Tea bun", "Fish bun", "Jam bun"];
        let coverage = price_coverage(&items, "Koswatta", &index);
        assert_eq!(coverage.total_items, 3);
        assert_eq!(coverage.with_price, 2);
        assert_eq!(coverage.missing, 1);
        assert_eq!(coverage.coverage_percent, 67);

        let empty: [&str; 0] = [];
        assert_eq!(price_coverage(&empty, "Koswatta", &index).coverage_percent, 0);
    }

    #[test]
    fn test_search_items_case_insensitive() {
        let items = ["Tea bun", "Fish bun", "Fish pastry", "Wade"];
        assert_eq!(search_items(&items, "FISH"), vec!["Fish bun", "Fish pastry"]);
        assert_eq!(search_items(&items, "").len(), 4);
        assert!(search_items(&items, "cake").is_empty());
    }

    #[tokio::test]
    async fn test_upsert_price_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let now = test_now();

        let result = upsert_price(&db, "Koswatta", "Tea bun", dec!(-1), now).await;
        assert!(matches!(result, Err(Error::InvalidPrice { .. })));

        let result = upsert_price(&db, "Koswatta", "  ", dec!(10), now).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_price_find_or_create() -> Result<()> {
        let db = setup_test_db().await?;
        let now = test_now();

        let created = upsert_price(&db, "Koswatta", "Tea bun", dec!(45), now).await?;
        let updated = upsert_price(&db, "Koswatta", "Tea bun", dec!(50), now).await?;

        assert_eq!(created.id, updated.id);
        assert_eq!(updated.price, dec!(50));

        let all = list_all_prices(&db).await?;
        assert_eq!(all.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_price() -> Result<()> {
        let db = setup_test_db().await?;
        upsert_price(&db, "Koswatta", "Tea bun", dec!(45), test_now()).await?;

        assert!(delete_price(&db, "Koswatta", "Tea bun").await?);
        assert!(!delete_price(&db, "Koswatta", "Tea bun").await?);
        assert!(get_price(&db, "Koswatta", "Tea bun").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_price_by_id_missing_record() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_price_by_id(&db, 42, dec!(10), test_now()).await;
        assert!(matches!(result, Err(Error::Database(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_price_edits_clears_saved() -> Result<()> {
        let db = setup_test_db().await?;
        upsert_price(&db, "Koswatta", "Tea bun", dec!(40), test_now()).await?;

        let mut session = PriceEditSession::new();
        session.set_price("Koswatta", "Tea bun", "45").unwrap();
        session.set_price("Koswatta", "Fish bun", "80.50").unwrap();

        let report = save_price_edits(&db, &mut session, test_now()).await;
        assert!(report.is_complete());
        assert_eq!(report.saved.len(), 2);
        assert!(session.is_empty());

        let index = PriceIndex::build(list_all_prices(&db).await?);
        assert_eq!(index.price_of("Koswatta", "Tea bun"), Some(dec!(45)));
        assert_eq!(index.price_of("Koswatta", "Fish bun"), Some(dec!(80.50)));
        assert_eq!(index.len(), 2);
        Ok(())
    }
}
