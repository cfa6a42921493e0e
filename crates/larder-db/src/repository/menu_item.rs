//! # Menu Item Repository
//!
//! A menu item prices a recipe at one location. Selling the menu item sells
//! its recipe.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use larder_core::validation::{validate_name, validate_price};
use larder_core::{LocationId, MenuItem, MenuItemId, Money, RecipeId};

/// Input for creating a menu item.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub location_id: LocationId,
    pub recipe_id: RecipeId,
    pub name: String,
    pub price: Money,
}

impl NewMenuItem {
    pub fn new(
        location_id: LocationId,
        recipe_id: RecipeId,
        name: impl Into<String>,
        price: Money,
    ) -> Self {
        NewMenuItem {
            location_id,
            recipe_id,
            name: name.into(),
            price,
        }
    }
}

/// Repository for menu item database operations.
#[derive(Debug, Clone)]
pub struct MenuItemRepository {
    pool: SqlitePool,
}

impl MenuItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuItemRepository { pool }
    }

    pub async fn create(&self, new: &NewMenuItem) -> DbResult<MenuItem> {
        validate_name("menu item name", &new.name)?;
        validate_price(new.price)?;

        debug!(
            location_id = new.location_id,
            recipe_id = new.recipe_id,
            price = %new.price,
            "Creating menu item"
        );

        let result = sqlx::query(
            "INSERT INTO menu_items (location_id, recipe_id, name, price_cents) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(new.location_id)
        .bind(new.recipe_id)
        .bind(&new.name)
        .bind(new.price.cents())
        .execute(&self.pool)
        .await?;

        Ok(MenuItem {
            id: result.last_insert_rowid(),
            location_id: new.location_id,
            recipe_id: new.recipe_id,
            name: new.name.clone(),
            price_cents: new.price.cents(),
            is_active: true,
        })
    }

    pub async fn get_by_id(&self, id: MenuItemId) -> DbResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, location_id, recipe_id, name, price_cents, is_active
            FROM menu_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists a location's active menu items ordered by name.
    pub async fn list_active_for_location(
        &self,
        location_id: LocationId,
    ) -> DbResult<Vec<MenuItem>> {
        let items = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, location_id, recipe_id, name, price_cents, is_active
            FROM menu_items
            WHERE location_id = ?1 AND is_active = 1
            ORDER BY name, id
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn deactivate(&self, id: MenuItemId) -> DbResult<()> {
        let result = sqlx::query("UPDATE menu_items SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu item", id));
        }
        Ok(())
    }

    // =========================================================================
    // In-transaction access
    // =========================================================================

    /// Resolves the active menu item that sells `recipe_id` at a location.
    ///
    /// When several active items bind the same recipe, the oldest (lowest
    /// id) wins.
    pub async fn find_active_for_recipe(
        conn: &mut SqliteConnection,
        location_id: LocationId,
        recipe_id: RecipeId,
    ) -> DbResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, location_id, recipe_id, name, price_cents, is_active
            FROM menu_items
            WHERE location_id = ?1 AND recipe_id = ?2 AND is_active = 1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(location_id)
        .bind(recipe_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Loads a menu item by ID if it is active and belongs to the location.
    pub async fn fetch_active(
        conn: &mut SqliteConnection,
        location_id: LocationId,
        menu_item_id: MenuItemId,
    ) -> DbResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, location_id, recipe_id, name, price_cents, is_active
            FROM menu_items
            WHERE id = ?1 AND location_id = ?2 AND is_active = 1
            "#,
        )
        .bind(menu_item_id)
        .bind(location_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::fixture;
    use crate::repository::NewRecipe;
    use larder_core::Quantity;

    #[tokio::test]
    async fn test_recipe_resolution_prefers_oldest_active_item() {
        let fx = fixture().await;
        let recipe = fx
            .db
            .recipes()
            .create(&NewRecipe::new("Salad").line(fx.lettuce.id, Quantity::from_milli(150)))
            .await
            .unwrap();

        let repo = fx.db.menu_items();
        let first = repo
            .create(&NewMenuItem::new(fx.location.id, recipe.id, "Salad", Money::from_cents(450)))
            .await
            .unwrap();
        let second = repo
            .create(&NewMenuItem::new(fx.location.id, recipe.id, "Salad (L)", Money::from_cents(650)))
            .await
            .unwrap();

        let mut conn = fx.db.pool().acquire().await.unwrap();
        let resolved = MenuItemRepository::find_active_for_recipe(&mut conn, fx.location.id, recipe.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, first.id);

        drop(conn);
        repo.deactivate(first.id).await.unwrap();

        let mut conn = fx.db.pool().acquire().await.unwrap();
        let resolved = MenuItemRepository::find_active_for_recipe(&mut conn, fx.location.id, recipe.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, second.id);
    }

    #[tokio::test]
    async fn test_fetch_active_checks_location() {
        let fx = fixture().await;
        let recipe = fx
            .db
            .recipes()
            .create(&NewRecipe::new("Side"))
            .await
            .unwrap();
        let item = fx
            .db
            .menu_items()
            .create(&NewMenuItem::new(fx.location.id, recipe.id, "Side", Money::from_cents(200)))
            .await
            .unwrap();

        let mut conn = fx.db.pool().acquire().await.unwrap();
        assert!(MenuItemRepository::fetch_active(&mut conn, fx.location.id, item.id)
            .await
            .unwrap()
            .is_some());
        assert!(MenuItemRepository::fetch_active(&mut conn, fx.location.id + 1, item.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_active_for_location() {
        let fx = fixture().await;
        let recipe = fx.db.recipes().create(&NewRecipe::new("Wrap")).await.unwrap();
        let repo = fx.db.menu_items();

        repo.create(&NewMenuItem::new(fx.location.id, recipe.id, "Wrap", Money::from_cents(799)))
            .await
            .unwrap();
        let retired = repo
            .create(&NewMenuItem::new(fx.location.id, recipe.id, "Old Wrap", Money::from_cents(699)))
            .await
            .unwrap();
        repo.deactivate(retired.id).await.unwrap();

        let items = repo.list_active_for_location(fx.location.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price(), Money::from_cents(799));
    }

    #[tokio::test]
    async fn test_blank_name_and_negative_price_rejected() {
        let fx = fixture().await;
        let recipe = fx.db.recipes().create(&NewRecipe::new("Soup")).await.unwrap();
        let repo = fx.db.menu_items();

        let err = repo
            .create(&NewMenuItem::new(fx.location.id, recipe.id, "Soup", Money::from_cents(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));

        let err = repo
            .create(&NewMenuItem::new(fx.location.id, recipe.id, "  ", Money::from_cents(300)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));

        assert!(repo.list_active_for_location(fx.location.id).await.unwrap().is_empty());
    }
}
