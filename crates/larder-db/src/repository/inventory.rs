//! # Inventory Repository
//!
//! On-hand balances, one row per (location, ingredient).
//!
//! ## Write Lock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite has no SELECT ... FOR UPDATE. A transaction that reads first   │
//! │  and writes later can lose the race for the write lock after another   │
//! │  writer has already changed the rows it read.                          │
//! │                                                                         │
//! │  lock() is a no-op UPDATE over the rows a ledger operation will use.   │
//! │  Issued as the FIRST statement of the transaction, it takes the        │
//! │  database write lock before any read happens:                          │
//! │                                                                         │
//! │    BEGIN                                                               │
//! │    UPDATE inventory SET quantity_milli = quantity_milli WHERE ...      │
//! │      ← other writers now wait (busy_timeout)                           │
//! │    SELECT ... (sees the latest committed balances)                     │
//! │    UPDATE / INSERT ...                                                 │
//! │    COMMIT                                                              │
//! │      ← next writer proceeds                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use larder_core::{IngredientId, Inventory, InventoryItem, LocationId, Quantity};

const SELECT_INVENTORY: &str = r#"
    SELECT id, location_id, ingredient_id, quantity_milli, unit
    FROM inventory
    WHERE location_id = ?1 AND ingredient_id = ?2
"#;

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Creates a zero-quantity row for (location, ingredient).
    ///
    /// ## Errors
    /// * `UniqueViolation` - the pair is already provisioned
    /// * `NotFound` - the ingredient does not exist
    pub async fn provision(
        &self,
        location_id: LocationId,
        ingredient_id: IngredientId,
    ) -> DbResult<Inventory> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_zero(&mut conn, location_id, ingredient_id).await
    }

    pub async fn get(
        &self,
        location_id: LocationId,
        ingredient_id: IngredientId,
    ) -> DbResult<Option<Inventory>> {
        let row = sqlx::query_as::<_, Inventory>(SELECT_INVENTORY)
            .bind(location_id)
            .bind(ingredient_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Lists a location's inventory with ingredient detail, by ingredient name.
    pub async fn list_for_location(&self, location_id: LocationId) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT
                i.id AS inventory_id,
                i.location_id,
                i.ingredient_id,
                g.name AS ingredient_name,
                COALESCE(i.unit, g.unit) AS unit,
                i.quantity_milli,
                g.cost_cents
            FROM inventory i
            JOIN ingredients g ON g.id = i.ingredient_id
            WHERE i.location_id = ?1
            ORDER BY g.name, i.id
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    // =========================================================================
    // In-transaction access
    // =========================================================================

    /// Takes the database write lock by touching the listed inventory rows.
    ///
    /// Must be the first statement of a ledger transaction. An empty
    /// `ingredient_ids` touches every row of the location. Returns the
    /// number of rows touched; the lock is taken even when that is zero.
    pub async fn lock(
        conn: &mut SqliteConnection,
        location_id: LocationId,
        ingredient_ids: &[IngredientId],
    ) -> DbResult<u64> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "UPDATE inventory SET quantity_milli = quantity_milli WHERE location_id = ",
        );
        query.push_bind(location_id);

        if !ingredient_ids.is_empty() {
            query.push(" AND ingredient_id IN (");
            let mut ids = query.separated(", ");
            for id in ingredient_ids {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");
        }

        let result = query.build().execute(&mut *conn).await?;

        debug!(location_id, rows = result.rows_affected(), "Inventory rows locked");
        Ok(result.rows_affected())
    }

    /// Reads one inventory row inside an open transaction.
    pub async fn fetch(
        conn: &mut SqliteConnection,
        location_id: LocationId,
        ingredient_id: IngredientId,
    ) -> DbResult<Option<Inventory>> {
        let row = sqlx::query_as::<_, Inventory>(SELECT_INVENTORY)
            .bind(location_id)
            .bind(ingredient_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row)
    }

    /// Inserts a zero-quantity row carrying the ingredient's unit.
    pub async fn insert_zero(
        conn: &mut SqliteConnection,
        location_id: LocationId,
        ingredient_id: IngredientId,
    ) -> DbResult<Inventory> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory (location_id, ingredient_id, quantity_milli, unit)
            SELECT ?1, id, 0, unit FROM ingredients WHERE id = ?2
            "#,
        )
        .bind(location_id)
        .bind(ingredient_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", ingredient_id));
        }

        debug!(location_id, ingredient_id, "Inventory row provisioned");

        Self::fetch(conn, location_id, ingredient_id)
            .await?
            .ok_or_else(|| DbError::Internal("provisioned inventory row vanished".to_string()))
    }

    /// Adds a signed delta to a row's quantity.
    pub async fn add_quantity(
        conn: &mut SqliteConnection,
        inventory_id: i64,
        delta: Quantity,
    ) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE inventory SET quantity_milli = quantity_milli + ?1 WHERE id = ?2")
                .bind(delta.milli())
                .bind(inventory_id)
                .execute(&mut *conn)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", inventory_id));
        }
        Ok(())
    }

    /// Overwrites a row's quantity (physical count).
    pub async fn set_quantity(
        conn: &mut SqliteConnection,
        inventory_id: i64,
        quantity: Quantity,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE inventory SET quantity_milli = ?1 WHERE id = ?2")
            .bind(quantity.milli())
            .bind(inventory_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", inventory_id));
        }
        Ok(())
    }
}
