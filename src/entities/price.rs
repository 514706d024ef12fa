//! Price entity - The current unit price of an item at a shop.
//!
//! At most one record exists per (`item_name`, `shop`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prices")]
pub struct Model {
    /// Unique identifier for the price record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Item the price applies to
    pub item_name: String,
    /// Shop the price applies to
    pub shop: String,
    /// Unit price in rupees, never negative
    pub price: Decimal,
    /// When the price was first entered
    pub created_at: DateTime,
    /// When the price was last changed
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
