//! Inventory entry entity - One day of stock movements for one item at one shop.
//!
//! The flow fields are entered by staff. `previous_day_remaining`,
//! `starting_inventory` and `selling` are denormalised snapshots of the
//! derived figures at save time; readers always recompute them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Daily inventory database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Business day the entry covers
    pub date: Date,
    /// Shop the entry belongs to
    pub shop: String,
    /// Item the entry belongs to
    pub item_name: String,
    /// Quantity received in the morning delivery
    pub morning_time: i64,
    /// Quantity received in the evening delivery
    pub evening_time: i64,
    /// Extra quantity received outside the scheduled deliveries
    pub extra_in: i64,
    /// Quantity transferred out to another shop
    pub transfer_out: i64,
    /// Quantity thrown away
    pub discard: i64,
    /// Quantity left at the end of the day
    pub remaining_inventory: i64,
    /// Previous day's remaining quantity at save time
    pub previous_day_remaining: i64,
    /// Derived starting inventory at save time
    pub starting_inventory: i64,
    /// Derived sold quantity at save time
    pub selling: i64,
    /// When the entry was created
    pub created_at: DateTime,
    /// When the entry was last saved
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
