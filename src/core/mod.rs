//! Core business logic - framework-agnostic reconciliation of daily stock.
//!
//! The pure parts (flow arithmetic, indexes, derivations, reports) take
//! in-memory data and never touch the store. The persistence parts take a
//! `&DatabaseConnection` and return the crate [`Result`](crate::errors::Result).

pub mod beverage;
pub mod catalog;
pub mod derive;
pub mod edits;
pub mod engine;
pub mod flows;
pub mod import;
pub mod index;
pub mod inventory;
pub mod price;
pub mod report;
pub mod save;
pub mod snapshot;
pub mod state;

pub use derive::{DerivedRow, DerivedSheet, derive_sheet};
pub use edits::EditSession;
pub use engine::Engine;
pub use flows::{FlowField, FlowFields};
pub use index::EntryKey;
pub use snapshot::Snapshot;
pub use state::Selection;
