//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each logical collection of the bakery ledger (catalog, prices, daily
//! inventory, beverage counters) maps to one table.

pub mod beverage_entry;
pub mod inventory_entry;
pub mod price;
pub mod shop_item;

// Re-export specific types to avoid conflicts
pub use beverage_entry::{
    Column as BeverageEntryColumn, Entity as BeverageEntry, Model as BeverageEntryModel,
};
pub use inventory_entry::{
    Column as InventoryEntryColumn, Entity as InventoryEntry, Model as InventoryEntryModel,
};
pub use price::{Column as PriceColumn, Entity as Price, Model as PriceModel};
pub use shop_item::{Column as ShopItemColumn, Entity as ShopItem, Model as ShopItemModel};
