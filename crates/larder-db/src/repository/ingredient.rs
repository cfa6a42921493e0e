//! # Ingredient Repository
//!
//! The ingredient's `cost_cents` is the running weighted-average cost.
//! Only ledger deliveries rewrite it, through [`IngredientRepository::update_cost`]
//! inside the delivery's transaction.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use larder_core::{Ingredient, IngredientId, Money};

const SELECT_INGREDIENT: &str = r#"
    SELECT id, name, description, cost_cents, unit, is_active
    FROM ingredients
    WHERE id = ?1
"#;

/// Input for creating an ingredient.
#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub name: String,
    pub description: Option<String>,
    pub cost: Money,
    pub unit: Option<String>,
}

impl NewIngredient {
    pub fn new(name: impl Into<String>, cost: Money) -> Self {
        NewIngredient {
            name: name.into(),
            description: None,
            cost,
            unit: None,
        }
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Repository for ingredient database operations.
#[derive(Debug, Clone)]
pub struct IngredientRepository {
    pool: SqlitePool,
}

impl IngredientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        IngredientRepository { pool }
    }

    pub async fn create(&self, new: &NewIngredient) -> DbResult<Ingredient> {
        debug!(name = %new.name, cost = %new.cost, "Creating ingredient");

        let result = sqlx::query(
            "INSERT INTO ingredients (name, description, cost_cents, unit) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.cost.cents())
        .bind(&new.unit)
        .execute(&self.pool)
        .await?;

        Ok(Ingredient {
            id: result.last_insert_rowid(),
            name: new.name.clone(),
            description: new.description.clone(),
            cost_cents: new.cost.cents(),
            unit: new.unit.clone(),
            is_active: true,
        })
    }

    /// Gets an ingredient by ID, active or not.
    ///
    /// Inactive ingredients still appear in movement history, so lookups by
    /// ID do not filter them out.
    pub async fn get_by_id(&self, id: IngredientId) -> DbResult<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(SELECT_INGREDIENT)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ingredient)
    }

    pub async fn list_active(&self) -> DbResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, description, cost_cents, unit, is_active
            FROM ingredients
            WHERE is_active = 1
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    pub async fn deactivate(&self, id: IngredientId) -> DbResult<()> {
        let result = sqlx::query("UPDATE ingredients SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", id));
        }
        Ok(())
    }

    // =========================================================================
    // In-transaction access
    // =========================================================================

    /// Reads an ingredient inside an open transaction.
    pub async fn fetch(
        conn: &mut SqliteConnection,
        id: IngredientId,
    ) -> DbResult<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(SELECT_INGREDIENT)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(ingredient)
    }

    /// Persists a new unit cost inside an open transaction.
    pub async fn update_cost(
        conn: &mut SqliteConnection,
        id: IngredientId,
        cost: Money,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE ingredients SET cost_cents = ?1 WHERE id = ?2")
            .bind(cost.cents())
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", id));
        }

        debug!(id, cost = %cost, "Ingredient cost updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::fixture;

    #[tokio::test]
    async fn test_update_cost_in_transaction() {
        let fx = fixture().await;

        let mut tx = fx.db.begin().await.unwrap();
        IngredientRepository::update_cost(&mut tx, fx.lettuce.id, Money::from_cents(275))
            .await
            .unwrap();
        let inside = IngredientRepository::fetch(&mut tx, fx.lettuce.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inside.cost(), Money::from_cents(275));
        tx.commit().await.unwrap();

        let after = fx.db.ingredients().get_by_id(fx.lettuce.id).await.unwrap().unwrap();
        assert_eq!(after.cost_cents, 275);
    }

    #[tokio::test]
    async fn test_deactivated_ingredient_still_resolves_by_id() {
        let fx = fixture().await;
        let repo = fx.db.ingredients();

        repo.deactivate(fx.tomato.id).await.unwrap();

        let active: Vec<IngredientId> = repo
            .list_active()
            .await
            .unwrap()
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(active, vec![fx.lettuce.id]);

        let tomato = repo.get_by_id(fx.tomato.id).await.unwrap().unwrap();
        assert!(!tomato.is_active);
    }

    #[tokio::test]
    async fn test_negative_cost_is_rejected_by_schema() {
        let fx = fixture().await;

        let err = fx
            .db
            .ingredients()
            .create(&NewIngredient::new("Saffron", Money::from_cents(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
