//! Shop item entity - One bakery item sellable at one shop.
//!
//! The `order` column drives display and processing order within the shop's
//! catalog. (`shop`, `item_name`) is unique.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shop_items")]
pub struct Model {
    /// Unique identifier for the catalog item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Shop (outlet) the item is sold at
    pub shop: String,
    /// Item name (e.g., "Tea bun")
    pub item_name: String,
    /// Position within the shop's catalog, ascending
    pub order: i64,
    /// When the item was added to the shop
    pub created_at: DateTime,
    /// When the item was last modified
    pub updated_at: DateTime,
}

/// `ShopItem` has no foreign keys; prices and entries join on (shop, item name)
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
