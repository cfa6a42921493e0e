//! # Movement Repository
//!
//! The append-only ledger.
//!
//! ## Append-Only
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert()     ✓  inside a ledger transaction                           │
//! │  list()       ✓  filtered history, newest first                        │
//! │  summarize()  ✓  cost / revenue totals                                 │
//! │  balances()   ✓  Σ quantity per ingredient vs on-hand                  │
//! │                                                                         │
//! │  update / delete: no API, and schema triggers abort them               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Date filters are pushed into SQL as range predicates on `recorded_at`.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use larder_core::{
    InventoryMovement, LedgerBalance, LocationId, Money, MovementFilter, MovementView, NewMovement,
};

/// Cost and revenue sums over a filtered set of movements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementTotals {
    pub delivery_cost: Money,
    pub sales_revenue: Money,
    pub waste_cost: Money,
}

/// Repository for ledger reads. Writes go through [`MovementRepository::insert`].
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Appends a movement inside an open transaction.
    pub async fn insert(
        conn: &mut SqliteConnection,
        movement: &NewMovement,
    ) -> DbResult<InventoryMovement> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                location_id, staff_id, ingredient_id, quantity_milli, movement_type,
                reference, cost_cents, revenue_cents, notes, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(movement.location_id)
        .bind(movement.staff_id)
        .bind(movement.ingredient_id)
        .bind(movement.quantity.milli())
        .bind(movement.movement_type)
        .bind(&movement.reference)
        .bind(movement.cost.map(|c| c.cents()))
        .bind(movement.revenue.map(|r| r.cents()))
        .bind(&movement.notes)
        .bind(movement.recorded_at)
        .execute(&mut *conn)
        .await?;

        let id = result.last_insert_rowid();
        debug!(
            id,
            movement_type = %movement.movement_type,
            ingredient_id = movement.ingredient_id,
            quantity = %movement.quantity,
            "Movement appended"
        );

        Ok(InventoryMovement {
            id,
            location_id: movement.location_id,
            staff_id: movement.staff_id,
            ingredient_id: movement.ingredient_id,
            quantity_milli: movement.quantity.milli(),
            movement_type: movement.movement_type,
            reference: movement.reference.clone(),
            cost_cents: movement.cost.map(|c| c.cents()),
            revenue_cents: movement.revenue.map(|r| r.cents()),
            notes: movement.notes.clone(),
            recorded_at: movement.recorded_at,
        })
    }

    /// Lists a location's movements matching the filter, newest first.
    ///
    /// Ties on `recorded_at` are broken by id, newest first.
    pub async fn list(
        &self,
        location_id: LocationId,
        filter: &MovementFilter,
    ) -> DbResult<Vec<MovementView>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                m.id, m.location_id, m.staff_id, m.ingredient_id, m.quantity_milli,
                m.movement_type, m.reference, m.cost_cents, m.revenue_cents, m.notes,
                m.recorded_at,
                g.name AS ingredient_name,
                s.name AS staff_name
            FROM inventory_movements m
            JOIN ingredients g ON g.id = m.ingredient_id
            JOIN staff s ON s.id = m.staff_id
            WHERE m.location_id = "#,
        );
        query.push_bind(location_id);
        push_time_range(&mut query, filter);
        if let Some(movement_type) = filter.movement_type {
            query.push(" AND m.movement_type = ").push_bind(movement_type);
        }
        query.push(" ORDER BY m.recorded_at DESC, m.id DESC");

        let movements = query
            .build_query_as::<MovementView>()
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Sums delivery cost, sales revenue and waste cost over the filter's
    /// time range. The filter's movement type is ignored.
    pub async fn summarize(
        &self,
        location_id: LocationId,
        filter: &MovementFilter,
    ) -> DbResult<MovementTotals> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN m.movement_type = 'delivery' THEN m.cost_cents END), 0),
                COALESCE(SUM(CASE WHEN m.movement_type = 'sale' THEN m.revenue_cents END), 0),
                COALESCE(SUM(CASE WHEN m.movement_type = 'waste' THEN m.cost_cents END), 0)
            FROM inventory_movements m
            WHERE m.location_id = "#,
        );
        query.push_bind(location_id);
        push_time_range(&mut query, filter);

        let (delivery_cost, sales_revenue, waste_cost) = query
            .build_query_as::<(i64, i64, i64)>()
            .fetch_one(&self.pool)
            .await?;

        Ok(MovementTotals {
            delivery_cost: Money::from_cents(delivery_cost),
            sales_revenue: Money::from_cents(sales_revenue),
            waste_cost: Money::from_cents(waste_cost),
        })
    }

    /// On-hand quantity next to Σ movement quantity, per inventory row.
    pub async fn balances(&self, location_id: LocationId) -> DbResult<Vec<LedgerBalance>> {
        let balances = sqlx::query_as::<_, LedgerBalance>(
            r#"
            SELECT
                i.ingredient_id,
                g.name AS ingredient_name,
                i.quantity_milli AS on_hand_milli,
                COALESCE((
                    SELECT SUM(m.quantity_milli)
                    FROM inventory_movements m
                    WHERE m.location_id = i.location_id AND m.ingredient_id = i.ingredient_id
                ), 0) AS ledger_milli
            FROM inventory i
            JOIN ingredients g ON g.id = i.ingredient_id
            WHERE i.location_id = ?1
            ORDER BY g.name, i.ingredient_id
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(balances)
    }
}

fn push_time_range(query: &mut QueryBuilder<'_, Sqlite>, filter: &MovementFilter) {
    if let Some(start) = filter.start {
        query.push(" AND m.recorded_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        query.push(" AND m.recorded_at <= ").push_bind(end);
    }
}
