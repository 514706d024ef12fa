//! Shop catalog business logic - which items each shop sells, and in what order.
//!
//! The `order` column drives the row order of every sheet and report. Moving an
//! item swaps its order with its neighbour's inside one transaction, so a
//! reader never observes two items sharing a position halfway through a move.

use crate::{
    config::AppConfig,
    entities::{ShopItem, shop_item},
    errors::{Error, Result},
};
use chrono::NaiveDateTime;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Retrieves the catalog of every shop, ordered by shop, order, then id.
pub async fn list_all_shop_items(db: &DatabaseConnection) -> Result<Vec<shop_item::Model>> {
    ShopItem::find()
        .order_by_asc(shop_item::Column::Shop)
        .order_by_asc(shop_item::Column::Order)
        .order_by_asc(shop_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the catalog of one shop in display order.
pub async fn list_shop_catalog<C>(db: &C, shop: &str) -> Result<Vec<shop_item::Model>>
where
    C: ConnectionTrait,
{
    ShopItem::find()
        .filter(shop_item::Column::Shop.eq(shop))
        .order_by_asc(shop_item::Column::Order)
        .order_by_asc(shop_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a catalog item by shop and exact name.
pub async fn get_shop_item<C>(db: &C, shop: &str, item_name: &str) -> Result<Option<shop_item::Model>>
where
    C: ConnectionTrait,
{
    ShopItem::find()
        .filter(shop_item::Column::Shop.eq(shop))
        .filter(shop_item::Column::ItemName.eq(item_name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts a catalog item at the given position.
pub async fn insert_shop_item<C>(
    db: &C,
    shop: &str,
    item_name: &str,
    order: i64,
    now: NaiveDateTime,
) -> Result<shop_item::Model>
where
    C: ConnectionTrait,
{
    shop_item::ActiveModel {
        shop: Set(shop.to_string()),
        item_name: Set(item_name.to_string()),
        order: Set(order),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Sets the position of a catalog item.
pub async fn update_shop_item_order<C>(
    db: &C,
    item_id: i64,
    order: i64,
    now: NaiveDateTime,
) -> Result<shop_item::Model>
where
    C: ConnectionTrait,
{
    let mut item: shop_item::ActiveModel = ShopItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("shop item {item_id}")))?
        .into();
    item.order = Set(order);
    item.updated_at = Set(now);
    item.update(db).await.map_err(Into::into)
}

/// Removes a catalog item by id. Returns the number of deleted rows.
///
/// Entries and prices of the item are kept.
pub async fn delete_shop_item_by_id(db: &DatabaseConnection, item_id: i64) -> Result<u64> {
    let result = ShopItem::delete_by_id(item_id).exec(db).await?;
    Ok(result.rows_affected)
}

/// Appends a custom item to the end of a shop's catalog.
///
/// # Errors
/// Returns an error if:
/// - The item name is empty or whitespace-only
/// - The shop already sells an item with this name
/// - The database operation fails
#[instrument(skip(db))]
pub async fn add_custom_item(
    db: &DatabaseConnection,
    shop: &str,
    item_name: &str,
    now: NaiveDateTime,
) -> Result<shop_item::Model> {
    let name = item_name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Item name cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;
    if get_shop_item(&txn, shop, name).await?.is_some() {
        return Err(Error::DuplicateItem {
            shop: shop.to_string(),
            item: name.to_string(),
        });
    }
    let next_order = list_shop_catalog(&txn, shop)
        .await?
        .iter()
        .map(|item| item.order)
        .max()
        .map_or(1, |max| max + 1);
    let item = insert_shop_item(&txn, shop, name, next_order, now).await?;
    txn.commit().await?;

    info!("Added '{}' to {} at position {}", name, shop, next_order);
    Ok(item)
}

/// Inserts the configured bakery items for every configured shop that has
/// no catalog yet. Returns the number of inserted items.
#[instrument(skip(db, config))]
pub async fn seed_catalog(
    db: &DatabaseConnection,
    config: &AppConfig,
    now: NaiveDateTime,
) -> Result<usize> {
    let mut inserted = 0;
    for shop in &config.shops {
        let txn = db.begin().await?;
        if !list_shop_catalog(&txn, shop).await?.is_empty() {
            continue;
        }
        for (position, item_name) in (1_i64..).zip(&config.bakery_items) {
            insert_shop_item(&txn, shop, item_name, position, now).await?;
            inserted += 1;
        }
        txn.commit().await?;
        debug!("Seeded catalog for {}", shop);
    }
    if inserted > 0 {
        info!("Seeded {} catalog items", inserted);
    }
    Ok(inserted)
}

/// Direction of a catalog move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards the top of the list
    Up,
    /// Towards the bottom of the list
    Down,
}

/// What a move request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The item swapped places with its neighbour
    Moved {
        /// Item that was moved
        item: String,
        /// Item it swapped with
        neighbour: String,
    },
    /// The item is already first (up) or last (down)
    AtBoundary,
    /// The shop has no item with this name
    NotFound,
}

/// The swap a move would perform on a catalog sorted by (order, id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan<'a> {
    /// Exchange the positions of the two items
    Swap {
        /// Item being moved
        item: &'a shop_item::Model,
        /// Its neighbour in the move direction
        neighbour: &'a shop_item::Model,
    },
    /// Nothing to do, the item is at the edge
    AtBoundary,
    /// Nothing to do, the item is not in the catalog
    NotFound,
}

/// Works out a move without touching the store.
#[must_use]
pub fn plan_move<'a>(
    catalog: &'a [shop_item::Model],
    item_name: &str,
    direction: MoveDirection,
) -> MovePlan<'a> {
    let Some(index) = catalog.iter().position(|item| item.item_name == item_name) else {
        return MovePlan::NotFound;
    };
    let neighbour = match direction {
        MoveDirection::Up => index.checked_sub(1),
        MoveDirection::Down => Some(index + 1).filter(|next| *next < catalog.len()),
    };
    match neighbour {
        Some(neighbour) => MovePlan::Swap {
            item: &catalog[index],
            neighbour: &catalog[neighbour],
        },
        None => MovePlan::AtBoundary,
    }
}

async fn write_dense_order<C>(
    db: &C,
    items: &[&shop_item::Model],
    now: NaiveDateTime,
) -> Result<usize>
where
    C: ConnectionTrait,
{
    let mut changed = 0;
    for (position, item) in (1_i64..).zip(items) {
        if item.order != position {
            update_shop_item_order(db, item.id, position, now).await?;
            changed += 1;
        }
    }
    Ok(changed)
}

/// Moves an item one place up or down within its shop.
///
/// Both writes of the swap happen in one transaction. When the two items
/// share an order value the shop is renumbered 1..n with the pair exchanged.
#[instrument(skip(db))]
pub async fn move_item(
    db: &DatabaseConnection,
    shop: &str,
    item_name: &str,
    direction: MoveDirection,
    now: NaiveDateTime,
) -> Result<MoveOutcome> {
    let txn = db.begin().await?;
    let catalog = list_shop_catalog(&txn, shop).await?;

    let (item, neighbour) = match plan_move(&catalog, item_name, direction) {
        MovePlan::Swap { item, neighbour } => (item, neighbour),
        MovePlan::AtBoundary => return Ok(MoveOutcome::AtBoundary),
        MovePlan::NotFound => return Ok(MoveOutcome::NotFound),
    };

    if item.order == neighbour.order {
        let mut reordered: Vec<&shop_item::Model> = catalog.iter().collect();
        let a = reordered.iter().position(|m| m.id == item.id);
        let b = reordered.iter().position(|m| m.id == neighbour.id);
        if let (Some(a), Some(b)) = (a, b) {
            reordered.swap(a, b);
        }
        write_dense_order(&txn, &reordered, now).await?;
    } else {
        update_shop_item_order(&txn, item.id, neighbour.order, now).await?;
        update_shop_item_order(&txn, neighbour.id, item.order, now).await?;
    }
    txn.commit().await?;

    debug!(
        "Moved {} {:?} past {} in {}",
        item.item_name, direction, neighbour.item_name, shop
    );
    Ok(MoveOutcome::Moved {
        item: item.item_name.clone(),
        neighbour: neighbour.item_name.clone(),
    })
}

/// Rewrites a shop's orders to 1..n, keeping the current sequence.
/// Returns the number of items whose order changed.
#[instrument(skip(db))]
pub async fn renumber_catalog(
    db: &DatabaseConnection,
    shop: &str,
    now: NaiveDateTime,
) -> Result<usize> {
    let txn = db.begin().await?;
    let catalog = list_shop_catalog(&txn, shop).await?;
    let items: Vec<&shop_item::Model> = catalog.iter().collect();
    let changed = write_dense_order(&txn, &items, now).await?;
    txn.commit().await?;
    Ok(changed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    async fn names(db: &DatabaseConnection, shop: &str) -> Result<Vec<String>> {
        Ok(list_shop_catalog(db, shop)
            .await?
            .into_iter()
            .map(|item| item.item_name)
            .collect())
    }

    async fn three_item_shop() -> Result<DatabaseConnection> {
        let db = setup_test_db().await?;
        insert_test_shop_item(&db, "Koswatta", "Tea bun", 1).await?;
        insert_test_shop_item(&db, "Koswatta", "Fish bun", 2).await?;
        insert_test_shop_item(&db, "Koswatta", "Jam bun", 3).await?;
        insert_test_shop_item(&db, "Arawwala", "Tea bun", 1).await?;
        Ok(db)
    }

    #[test]
    fn test_plan_move_boundaries() {
        let catalog = vec![
            shop_item_model(1, "Koswatta", "Tea bun", 1),
            shop_item_model(2, "Koswatta", "Fish bun", 2),
        ];
        assert_eq!(
            plan_move(&catalog, "Tea bun", MoveDirection::Up),
            MovePlan::AtBoundary
        );
        assert_eq!(
            plan_move(&catalog, "Fish bun", MoveDirection::Down),
            MovePlan::AtBoundary
        );
        assert_eq!(
            plan_move(&catalog, "Wade", MoveDirection::Up),
            MovePlan::NotFound
        );
        assert_eq!(
            plan_move(&catalog, "Tea bun", MoveDirection::Down),
            MovePlan::Swap {
                item: &catalog[0],
                neighbour: &catalog[1]
            }
        );
    }

    #[tokio::test]
    async fn test_move_up_swaps_with_predecessor_only() -> Result<()> {
        let db = three_item_shop().await?;

        let outcome = move_item(&db, "Koswatta", "Jam bun", MoveDirection::Up, test_now()).await?;
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                item: "Jam bun".to_string(),
                neighbour: "Fish bun".to_string(),
            }
        );
        assert_eq!(names(&db, "Koswatta").await?, vec!["Tea bun", "Jam bun", "Fish bun"]);

        let orders: Vec<i64> = list_shop_catalog(&db, "Koswatta")
            .await?
            .iter()
            .map(|item| item.order)
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
        // Other shops are untouched
        assert_eq!(names(&db, "Arawwala").await?, vec!["Tea bun"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_move_at_boundary_is_noop() -> Result<()> {
        let db = three_item_shop().await?;
        assert_eq!(
            move_item(&db, "Koswatta", "Tea bun", MoveDirection::Up, test_now()).await?,
            MoveOutcome::AtBoundary
        );
        assert_eq!(
            move_item(&db, "Koswatta", "Jam bun", MoveDirection::Down, test_now()).await?,
            MoveOutcome::AtBoundary
        );
        assert_eq!(
            move_item(&db, "Koswatta", "Wade", MoveDirection::Down, test_now()).await?,
            MoveOutcome::NotFound
        );
        assert_eq!(names(&db, "Koswatta").await?, vec!["Tea bun", "Fish bun", "Jam bun"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_move_with_tied_orders() -> Result<()> {
        let db = setup_test_db().await?;
        insert_test_shop_item(&db, "Koswatta", "Tea bun", 1).await?;
        insert_test_shop_item(&db, "Koswatta", "Fish bun", 1).await?;

        move_item(&db, "Koswatta", "Fish bun", MoveDirection::Up, test_now()).await?;
        assert_eq!(names(&db, "Koswatta").await?, vec!["Fish bun", "Tea bun"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_custom_item_appends() -> Result<()> {
        let db = three_item_shop().await?;
        let item = add_custom_item(&db, "Koswatta", "  Sausage roll ", test_now()).await?;
        assert_eq!(item.item_name, "Sausage roll");
        assert_eq!(item.order, 4);

        let first = add_custom_item(&db, "Depanama", "Tea bun", test_now()).await?;
        assert_eq!(first.order, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_custom_item_rejects_duplicates() -> Result<()> {
        let db = three_item_shop().await?;
        let result = add_custom_item(&db, "Koswatta", "Fish bun", test_now()).await;
        assert!(matches!(result, Err(Error::DuplicateItem { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_custom_item_rejects_empty_name() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = add_custom_item(&db, "Koswatta", "   ", test_now()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_renumber_catalog() -> Result<()> {
        let db = setup_test_db().await?;
        insert_test_shop_item(&db, "Koswatta", "Tea bun", 10).await?;
        insert_test_shop_item(&db, "Koswatta", "Fish bun", 20).await?;
        insert_test_shop_item(&db, "Koswatta", "Jam bun", 20).await?;

        assert_eq!(renumber_catalog(&db, "Koswatta", test_now()).await?, 3);
        let orders: Vec<i64> = list_shop_catalog(&db, "Koswatta")
            .await?
            .iter()
            .map(|item| item.order)
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(names(&db, "Koswatta").await?, vec!["Tea bun", "Fish bun", "Jam bun"]);
        assert_eq!(renumber_catalog(&db, "Koswatta", test_now()).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_catalog_skips_seeded_shops() -> Result<()> {
        let db = setup_test_db().await?;
        insert_test_shop_item(&db, "Koswatta", "Tea bun", 1).await?;
        let config = AppConfig {
            shops: vec!["Koswatta".to_string(), "Arawwala".to_string()],
            bakery_items: vec!["Tea bun".to_string(), "Fish bun".to_string()],
            ..AppConfig::default()
        };

        assert_eq!(seed_catalog(&db, &config, test_now()).await?, 2);
        assert_eq!(names(&db, "Arawwala").await?, vec!["Tea bun", "Fish bun"]);
        assert_eq!(names(&db, "Koswatta").await?, vec!["Tea bun"]);
        assert_eq!(seed_catalog(&db, &config, test_now()).await?, 0);

        assert_eq!(delete_shop_item_by_id(&db, 1).await?, 1);
        Ok(())
    }
}
