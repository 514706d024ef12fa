//! The reconciliation engine: the entry point a front end talks to.
//!
//! [`Engine`] owns the store connection and the configuration. Writes go
//! through a FIFO queue, so a save issued while another save or a reorder is
//! running waits for it instead of being refused. Every write is followed by
//! a full re-fetch and the caller gets the fresh [`Snapshot`] back.

use crate::{
    config::AppConfig,
    core::{
        beverage::{self, BeverageSheet, derive_beverages},
        catalog::{self, MoveDirection, MoveOutcome},
        derive::{DerivedSheet, derive_sheet},
        edits::EditSession,
        index::EntryKey,
        inventory,
        price::{self, PriceEditSession, PriceKey},
        report::{SummaryReport, build_summary},
        save::SaveReport,
        snapshot::{Snapshot, fetch_snapshot},
        state::Selection,
    },
    entities::shop_item,
    errors::Result,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// Result of a write together with the snapshot re-fetched after it.
#[derive(Debug, Clone)]
pub struct Applied<T> {
    /// What the write did
    pub outcome: T,
    /// Every collection as persisted after the write
    pub snapshot: Snapshot,
}

/// Store connection, configuration and the write queue.
#[derive(Debug)]
pub struct Engine {
    db: DatabaseConnection,
    config: AppConfig,
    queue: Mutex<()>,
}

fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

impl Engine {
    /// Wraps a prepared connection.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db,
            config,
            queue: Mutex::new(()),
        }
    }

    /// The store connection
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// The loaded configuration
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Loads every collection.
    pub async fn refresh(&self) -> Result<Snapshot> {
        fetch_snapshot(&self.db).await
    }

    /// Bakery rows of the selection, drafts applied.
    #[must_use]
    pub fn sheet(
        &self,
        snapshot: &Snapshot,
        selection: &Selection,
        edits: &EditSession,
    ) -> DerivedSheet {
        derive_sheet(snapshot, &selection.shop, selection.date, edits)
    }

    /// Beverage rows of the selection for the configured beverages.
    #[must_use]
    pub fn beverages(&self, snapshot: &Snapshot, selection: &Selection) -> BeverageSheet {
        derive_beverages(
            &self.config.beverages,
            &selection.shop,
            selection.date,
            &snapshot.beverages,
            &snapshot.prices,
        )
    }

    /// Saves the dirty inventory drafts and re-fetches.
    ///
    /// # Errors
    /// Individual write failures are reported in the [`SaveReport`]; only
    /// the re-fetch can fail the whole call.
    #[instrument(skip(self, edits))]
    pub async fn save_inventory(
        &self,
        edits: &mut EditSession,
    ) -> Result<Applied<SaveReport<EntryKey>>> {
        let _turn = self.queue.lock().await;
        let outcome = inventory::save_edits(&self.db, edits, now()).await;
        info!("{}", outcome.summary());
        let snapshot = fetch_snapshot(&self.db).await?;
        Ok(Applied { outcome, snapshot })
    }

    /// Saves the pending price edits and re-fetches.
    #[instrument(skip(self, edits))]
    pub async fn save_prices(
        &self,
        edits: &mut PriceEditSession,
    ) -> Result<Applied<SaveReport<PriceKey>>> {
        let _turn = self.queue.lock().await;
        let outcome = price::save_price_edits(&self.db, edits, now()).await;
        info!("{}", outcome.summary());
        let snapshot = fetch_snapshot(&self.db).await?;
        Ok(Applied { outcome, snapshot })
    }

    /// Deletes a price and re-fetches.
    #[instrument(skip(self))]
    pub async fn delete_price(&self, shop: &str, item_name: &str) -> Result<Applied<bool>> {
        let _turn = self.queue.lock().await;
        let outcome = price::delete_price(&self.db, shop, item_name).await?;
        let snapshot = fetch_snapshot(&self.db).await?;
        Ok(Applied { outcome, snapshot })
    }

    /// Moves a catalog item one place and re-fetches.
    #[instrument(skip(self))]
    pub async fn move_item(
        &self,
        shop: &str,
        item_name: &str,
        direction: MoveDirection,
    ) -> Result<Applied<MoveOutcome>> {
        let _turn = self.queue.lock().await;
        let outcome = catalog::move_item(&self.db, shop, item_name, direction, now()).await?;
        let snapshot = fetch_snapshot(&self.db).await?;
        Ok(Applied { outcome, snapshot })
    }

    /// Adds a custom item to a shop and re-fetches.
    #[instrument(skip(self))]
    pub async fn add_custom_item(
        &self,
        shop: &str,
        item_name: &str,
    ) -> Result<Applied<shop_item::Model>> {
        let _turn = self.queue.lock().await;
        let outcome = catalog::add_custom_item(&self.db, shop, item_name, now()).await?;
        let snapshot = fetch_snapshot(&self.db).await?;
        Ok(Applied { outcome, snapshot })
    }

    /// Stores a beverage counter reading for the selection and re-fetches.
    #[instrument(skip(self))]
    pub async fn record_beverage_count(
        &self,
        selection: &Selection,
        item_name: &str,
        raw: &str,
    ) -> Result<Applied<i64>> {
        let _turn = self.queue.lock().await;
        let saved = beverage::record_beverage_count(
            &self.db,
            &selection.shop,
            selection.date,
            item_name,
            raw,
            now(),
        )
        .await?;
        let snapshot = fetch_snapshot(&self.db).await?;
        Ok(Applied {
            outcome: saved.today_count,
            snapshot,
        })
    }

    /// Seeds the configured catalog for shops that have none.
    pub async fn seed_catalog(&self) -> Result<usize> {
        let _turn = self.queue.lock().await;
        catalog::seed_catalog(&self.db, &self.config, now()).await
    }

    /// Builds the summary report of the selection from the persisted data
    /// and any unsaved drafts.
    pub async fn summary(
        &self,
        selection: &Selection,
        edits: &EditSession,
        opening_balance: Decimal,
    ) -> Result<SummaryReport> {
        let snapshot = self.refresh().await?;
        let sheet = self.sheet(&snapshot, selection, edits);
        let beverages = self.beverages(&snapshot, selection);
        Ok(build_summary(&sheet, &beverages, opening_balance))
    }
}
