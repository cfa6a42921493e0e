//! # Schema Migrations
//!
//! The SQL under `migrations/sqlite/` is compiled into the binary and applied
//! when a [`Database`](crate::Database) opens.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   locations, staff, ingredients, recipes,
//!                              menu_items, inventory, inventory_movements
//!                              + append-only triggers on the ledger
//! ```
//!
//! ## Adding a Migration
//!
//! 1. Add `NNN_description.sql` with the next number (`002_add_suppliers.sql`)
//! 2. Never edit an applied file; sqlx checks its checksum
//! 3. Never relax the append-only triggers on `inventory_movements`

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every pending migration in file order. Safe to call repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking schema");

    MIGRATOR.run(pool).await?;

    info!("Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
///
/// A database that was never migrated reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    let applied: i64 = match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
    {
        Ok(count) => count,
        // No bookkeeping table yet.
        Err(sqlx::Error::Database(_)) => 0,
        Err(err) => return Err(err.into()),
    };

    Ok((embedded, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_unmigrated_database_reports_nothing_applied() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        let (embedded, applied) = migration_status(db.pool()).await.unwrap();
        assert!(embedded >= 1);
        assert_eq!(applied, 0);

        run_migrations(db.pool()).await.unwrap();
        run_migrations(db.pool()).await.unwrap();

        let (embedded, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(embedded, applied);
    }

    #[tokio::test]
    async fn test_schema_has_ledger_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' AND name NOT LIKE 'sqlite%' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(
            tables,
            vec![
                "ingredients",
                "inventory",
                "inventory_movements",
                "locations",
                "menu_items",
                "recipe_ingredients",
                "recipes",
                "staff",
            ]
        );
    }
}
