//! # Recipe Repository
//!
//! A recipe is a bill of materials: ordered (ingredient, quantity per
//! portion) lines. Lines are written together with the recipe in one
//! transaction and read back in insertion order.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use larder_core::validation::{validate_name, validate_recipe_quantity};
use larder_core::{IngredientId, Quantity, Recipe, RecipeId, RecipeIngredient};

const SELECT_LINES: &str = r#"
    SELECT ri.id, ri.recipe_id, ri.ingredient_id, g.name AS ingredient_name, ri.quantity_milli
    FROM recipe_ingredients ri
    JOIN ingredients g ON g.id = ri.ingredient_id
    WHERE ri.recipe_id = ?1
    ORDER BY ri.id
"#;

/// One line of a new recipe.
#[derive(Debug, Clone, Copy)]
pub struct NewRecipeLine {
    pub ingredient_id: IngredientId,
    /// Per portion; zero is allowed for optional garnish.
    pub quantity: Quantity,
}

/// Input for creating a recipe with its lines.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub description: Option<String>,
    pub lines: Vec<NewRecipeLine>,
}

impl NewRecipe {
    pub fn new(name: impl Into<String>) -> Self {
        NewRecipe {
            name: name.into(),
            description: None,
            lines: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a line. Line order is preserved.
    pub fn line(mut self, ingredient_id: IngredientId, quantity: Quantity) -> Self {
        self.lines.push(NewRecipeLine {
            ingredient_id,
            quantity,
        });
        self
    }
}

/// Repository for recipe database operations.
#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RecipeRepository { pool }
    }

    /// Creates a recipe and all of its lines atomically.
    ///
    /// ## Errors
    /// * `CheckViolation` - a blank name or a negative line quantity (nothing is written)
    /// * `ForeignKeyViolation` - a line references an unknown ingredient
    pub async fn create(&self, new: &NewRecipe) -> DbResult<Recipe> {
        validate_name("recipe name", &new.name)?;
        for line in &new.lines {
            validate_recipe_quantity(line.quantity)?;
        }

        debug!(name = %new.name, lines = new.lines.len(), "Creating recipe");

        let mut tx = self.pool.begin().await?;

        let recipe_id = sqlx::query("INSERT INTO recipes (name, description) VALUES (?1, ?2)")
            .bind(&new.name)
            .bind(&new.description)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        for line in &new.lines {
            sqlx::query(
                "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity_milli) VALUES (?1, ?2, ?3)",
            )
            .bind(recipe_id)
            .bind(line.ingredient_id)
            .bind(line.quantity.milli())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Recipe {
            id: recipe_id,
            name: new.name.clone(),
            description: new.description.clone(),
            is_active: true,
        })
    }

    pub async fn get_by_id(&self, id: RecipeId) -> DbResult<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(
            "SELECT id, name, description, is_active FROM recipes WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recipe)
    }

    /// Returns the recipe's lines in insertion order, with ingredient names.
    pub async fn ingredients(&self, recipe_id: RecipeId) -> DbResult<Vec<RecipeIngredient>> {
        let lines = sqlx::query_as::<_, RecipeIngredient>(SELECT_LINES)
            .bind(recipe_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    pub async fn list_active(&self) -> DbResult<Vec<Recipe>> {
        let recipes = sqlx::query_as::<_, Recipe>(
            "SELECT id, name, description, is_active FROM recipes WHERE is_active = 1 ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(recipes)
    }

    pub async fn deactivate(&self, id: RecipeId) -> DbResult<()> {
        let result = sqlx::query("UPDATE recipes SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Recipe", id));
        }
        Ok(())
    }

    /// Reads the recipe's lines inside an open transaction.
    pub async fn fetch_ingredients(
        conn: &mut SqliteConnection,
        recipe_id: RecipeId,
    ) -> DbResult<Vec<RecipeIngredient>> {
        let lines = sqlx::query_as::<_, RecipeIngredient>(SELECT_LINES)
            .bind(recipe_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::fixture;

    #[tokio::test]
    async fn test_lines_come_back_in_order_with_names() {
        let fx = fixture().await;
        let repo = fx.db.recipes();

        let salad = repo
            .create(
                &NewRecipe::new("Garden Salad")
                    .line(fx.tomato.id, Quantity::from_milli(100))
                    .line(fx.lettuce.id, Quantity::from_milli(150))
                    .line(fx.tomato.id, Quantity::zero()),
            )
            .await
            .unwrap();

        let lines = repo.ingredients(salad.id).await.unwrap();
        let shape: Vec<(&str, i64)> = lines
            .iter()
            .map(|l| (l.ingredient_name.as_str(), l.quantity_milli))
            .collect();
        assert_eq!(shape, vec![("Tomato", 100), ("Lettuce", 150), ("Tomato", 0)]);
    }

    #[tokio::test]
    async fn test_negative_line_writes_nothing() {
        let fx = fixture().await;
        let repo = fx.db.recipes();

        let err = repo
            .create(
                &NewRecipe::new("Broken")
                    .line(fx.lettuce.id, Quantity::from_milli(100))
                    .line(fx.tomato.id, Quantity::from_milli(-1)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::CheckViolation { .. }));
        assert!(repo.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ingredient_rolls_back_recipe() {
        let fx = fixture().await;
        let repo = fx.db.recipes();

        let err = repo
            .create(&NewRecipe::new("Mystery").line(999, Quantity::from_units(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(repo.list_active().await.unwrap().is_empty());
    }
}
