//! # Reports
//!
//! Read-only views over committed ledger state. No locks are taken; a report
//! reflects the last committed write.
//!
//! ```text
//!   report_summary(loc, filter)
//!   ┌──────────────────────────┐      ┌──────────────────────────────────┐
//!   │ movements in date range  │      │ inventory right now              │
//!   │  Σ cost    (delivery)    │      │  Σ quantity × ingredient cost    │
//!   │  Σ revenue (sale)        │      │  (never date-filtered)           │
//!   │  Σ cost    (waste)       │      │                                  │
//!   └────────────┬─────────────┘      └────────────────┬─────────────────┘
//!                └──────────────► ReportSummary ◄──────┘
//! ```

use tracing::{debug, warn};

use larder_core::{
    InventoryItem, LedgerBalance, Location, LocationId, MenuItem, Money, MovementFilter,
    MovementView, ReportSummary, Staff,
};
use larder_db::Database;

use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        ReportService { db }
    }

    /// Movements matching the filter, newest first.
    pub async fn inventory_movements(
        &self,
        location_id: LocationId,
        filter: &MovementFilter,
    ) -> LedgerResult<Vec<MovementView>> {
        let movements = self.db.movements().list(location_id, filter).await?;
        debug!(location_id, count = movements.len(), "Movements listed");
        Ok(movements)
    }

    /// Cost and revenue totals over the filter's date range plus the current
    /// inventory value. The filter's movement type is ignored.
    pub async fn report_summary(
        &self,
        location_id: LocationId,
        filter: &MovementFilter,
    ) -> LedgerResult<ReportSummary> {
        let totals = self.db.movements().summarize(location_id, filter).await?;
        let inventory = self.db.inventory().list_for_location(location_id).await?;

        let total_inventory_value = inventory
            .iter()
            .map(InventoryItem::value)
            .try_fold(Money::zero(), |total, value| total.checked_add(value))
            .ok_or_else(|| {
                LedgerError::InvalidState(format!(
                    "inventory value at location {location_id} overflows"
                ))
            })?;

        let summary = ReportSummary {
            total_delivery_cost: totals.delivery_cost,
            total_sales_revenue: totals.sales_revenue,
            total_waste_cost: totals.waste_cost,
            total_inventory_value,
        };

        debug!(
            location_id,
            delivery_cost = %summary.total_delivery_cost,
            sales_revenue = %summary.total_sales_revenue,
            waste_cost = %summary.total_waste_cost,
            inventory_value = %summary.total_inventory_value,
            "Report summary computed"
        );
        Ok(summary)
    }

    /// On-hand stock with ingredient name, unit and cost, by ingredient name.
    pub async fn current_inventory(&self, location_id: LocationId) -> LedgerResult<Vec<InventoryItem>> {
        Ok(self.db.inventory().list_for_location(location_id).await?)
    }

    pub async fn menu_items(&self, location_id: LocationId) -> LedgerResult<Vec<MenuItem>> {
        Ok(self.db.menu_items().list_active_for_location(location_id).await?)
    }

    pub async fn locations(&self) -> LedgerResult<Vec<Location>> {
        Ok(self.db.locations().list_active().await?)
    }

    pub async fn staff(&self, location_id: LocationId) -> LedgerResult<Vec<Staff>> {
        Ok(self.db.staff().list_by_location(location_id).await?)
    }

    /// Inventory rows whose balance disagrees with the sum of their
    /// movements. Empty when the ledger is consistent.
    pub async fn reconcile(&self, location_id: LocationId) -> LedgerResult<Vec<LedgerBalance>> {
        let drifted: Vec<LedgerBalance> = self
            .db
            .movements()
            .balances(location_id)
            .await?
            .into_iter()
            .filter(|balance| !balance.is_consistent())
            .collect();

        for balance in &drifted {
            warn!(
                location_id,
                ingredient = %balance.ingredient_name,
                drift = %balance.drift(),
                "Inventory balance disagrees with ledger"
            );
        }
        Ok(drifted)
    }
}
