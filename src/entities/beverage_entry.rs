//! Beverage entry entity - Cumulative machine counter reading for a beverage.
//!
//! Beverages are not tracked by flows; the day's sales are the difference
//! between today's counter and the previous day's.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Beverage counter database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "beverages")]
pub struct Model {
    /// Unique identifier for the reading
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Business day of the reading
    pub date: Date,
    /// Shop the machine is in
    pub shop: String,
    /// Beverage name (e.g., "Nescafe")
    pub item_name: String,
    /// Cumulative counter value at close of day
    pub today_count: i64,
    /// When the reading was created
    pub created_at: DateTime,
    /// When the reading was last changed
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
