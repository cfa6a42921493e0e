//! # Ledger Operations
//!
//! Deliveries, sales and stock counts. Each one is a single SQLite
//! transaction that updates on-hand balances and appends movements.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  validate request (no transaction yet)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │  lock inventory rows   ← first statement, takes the write lock         │
//! │  read rows             ← sees the latest committed balances            │
//! │  compute               ← larder_core::costing                          │
//! │  write rows + append movements                                         │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any `?` before COMMIT drops the transaction, which rolls it back.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sale: validate all, then mutate all
//! ```text
//! Sell 2 × Chicken Salad
//!   recipe lines: chicken 0.150, lettuce 0.100, parsley 0.000
//!
//!   pass 1 (read only)
//!     chicken  required 0.300  available 1.000  ok
//!     lettuce  required 0.200  available 0.150  ✗ InsufficientInventory
//!     parsley  skipped (zero quantity)
//!
//!   pass 2 runs only when every ingredient passed:
//!     one sale movement per ingredient, revenue split evenly
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use larder_core::costing::{self, CostUpdate};
use larder_core::validation::{
    validate_actual_quantity, validate_delivery_cost, validate_delivery_quantity, validate_notes,
    validate_reference, validate_sale_quantity,
};
use larder_core::{
    CoreError, IngredientId, InventoryMovement, LocationId, MenuItemId, Money,
    MovementType, NewMovement, Quantity, RecipeId, StaffId, ValidationError,
};
use larder_db::repository::{
    IngredientRepository, InventoryRepository, MenuItemRepository, MovementRepository,
    RecipeRepository,
};
use larder_db::{Database, DbError};

use crate::clock::{Clock, SystemClock};
use crate::config::LedgerSettings;
use crate::error::{LedgerError, LedgerResult};

// =============================================================================
// Requests
// =============================================================================

/// Stock received from a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub location_id: LocationId,
    pub staff_id: StaffId,
    pub ingredient_id: IngredientId,
    /// Must be positive.
    pub quantity: Quantity,
    /// Unit cost of this delivery. Zero is accepted and leaves the
    /// ingredient's cost alone.
    pub cost: Money,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DeliveryRequest {
    pub fn new(
        location_id: LocationId,
        staff_id: StaffId,
        ingredient_id: IngredientId,
        quantity: Quantity,
        cost: Money,
    ) -> Self {
        DeliveryRequest {
            location_id,
            staff_id,
            ingredient_id,
            quantity,
            cost,
            reference: None,
            notes: None,
        }
    }

    /// Supplier invoice or delivery note number.
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_delivery_quantity(self.quantity)?;
        validate_delivery_cost(self.cost)?;
        validate_reference(self.reference.as_deref())?;
        validate_notes(self.notes.as_deref())
    }
}

/// What a sale sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SaleTarget {
    /// The location's active menu item for this recipe.
    Recipe(RecipeId),
    /// A specific menu item, which must be active at the location.
    MenuItem(MenuItemId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub location_id: LocationId,
    pub staff_id: StaffId,
    pub target: SaleTarget,
    /// Portions sold, 1..=999.
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SaleRequest {
    pub fn recipe(
        location_id: LocationId,
        staff_id: StaffId,
        recipe_id: RecipeId,
        quantity: i64,
    ) -> Self {
        SaleRequest {
            location_id,
            staff_id,
            target: SaleTarget::Recipe(recipe_id),
            quantity,
            notes: None,
        }
    }

    pub fn menu_item(
        location_id: LocationId,
        staff_id: StaffId,
        menu_item_id: MenuItemId,
        quantity: i64,
    ) -> Self {
        SaleRequest {
            location_id,
            staff_id,
            target: SaleTarget::MenuItem(menu_item_id),
            quantity,
            notes: None,
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_sale_quantity(self.quantity)?;
        validate_notes(self.notes.as_deref())
    }
}

/// A physical count of one ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCountRequest {
    pub location_id: LocationId,
    pub staff_id: StaffId,
    pub ingredient_id: IngredientId,
    /// What is actually on the shelf. Zero or more.
    pub actual_quantity: Quantity,
    #[serde(default)]
    pub notes: Option<String>,
}

impl StockCountRequest {
    pub fn new(
        location_id: LocationId,
        staff_id: StaffId,
        ingredient_id: IngredientId,
        actual_quantity: Quantity,
    ) -> Self {
        StockCountRequest {
            location_id,
            staff_id,
            ingredient_id,
            actual_quantity,
            notes: None,
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_actual_quantity(self.actual_quantity)?;
        validate_notes(self.notes.as_deref())
    }
}

/// Total stock one sale takes from one ingredient.
struct Need {
    ingredient_id: IngredientId,
    ingredient_name: String,
    required: Quantity,
}

/// A need that passed validation.
struct Debit {
    need: Need,
    inventory_id: i64,
}

// =============================================================================
// LedgerService
// =============================================================================

/// Executes ledger operations against the database.
///
/// ## Example
/// ```rust,ignore
/// let ledger = LedgerService::new(db.clone(), config.ledger.clone());
///
/// ledger
///     .accept_delivery(&DeliveryRequest::new(loc, staff, chicken, Quantity::from_units(10), Money::from_cents(700)))
///     .await?;
///
/// let movements = ledger
///     .sell_item(&SaleRequest::recipe(loc, staff, chicken_salad, 2))
///     .await?;
/// ```
#[derive(Clone)]
pub struct LedgerService {
    db: Database,
    settings: LedgerSettings,
    clock: Arc<dyn Clock>,
}

impl LedgerService {
    pub fn new(db: Database, settings: LedgerSettings) -> Self {
        LedgerService {
            db,
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock that stamps movements.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    // =========================================================================
    // Accept Delivery
    // =========================================================================

    /// Adds delivered stock and re-averages the ingredient's unit cost.
    ///
    /// ## Errors
    /// * `InvalidInput` - quantity not positive, negative cost, text too long
    /// * `NotFound` - no inventory row for (location, ingredient) and
    ///   auto-provisioning is off, or the ingredient does not exist
    /// * `InvalidState` - the new balance does not fit in a `Quantity`
    pub async fn accept_delivery(&self, req: &DeliveryRequest) -> LedgerResult<InventoryMovement> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        InventoryRepository::lock(&mut tx, req.location_id, &[req.ingredient_id]).await?;

        let inventory =
            match InventoryRepository::fetch(&mut tx, req.location_id, req.ingredient_id).await? {
                Some(row) => row,
                None if self.settings.auto_provision_inventory => {
                    debug!(
                        location_id = req.location_id,
                        ingredient_id = req.ingredient_id,
                        "Auto-provisioning inventory for delivery"
                    );
                    InventoryRepository::insert_zero(&mut tx, req.location_id, req.ingredient_id)
                        .await?
                }
                None => {
                    warn!(
                        location_id = req.location_id,
                        ingredient_id = req.ingredient_id,
                        "Delivery rejected: ingredient not stocked at location"
                    );
                    return Err(inventory_not_found(req.location_id, req.ingredient_id));
                }
            };

        let Some(balance) = inventory.quantity().checked_add(req.quantity) else {
            warn!(
                location_id = req.location_id,
                ingredient_id = req.ingredient_id,
                on_hand = %inventory.quantity(),
                quantity = %req.quantity,
                "Delivery rejected: balance would overflow"
            );
            return Err(LedgerError::InvalidState(format!(
                "delivery of {} would overflow the balance of ingredient {}",
                req.quantity, req.ingredient_id
            )));
        };

        let ingredient = IngredientRepository::fetch(&mut tx, req.ingredient_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Ingredient", req.ingredient_id))?;

        let update = costing::weighted_average_cost(
            inventory.quantity(),
            ingredient.cost(),
            req.quantity,
            req.cost,
        );
        if let CostUpdate::Updated(new_cost) = update {
            if new_cost != ingredient.cost() {
                IngredientRepository::update_cost(&mut tx, ingredient.id, new_cost).await?;
            }
        }

        InventoryRepository::set_quantity(&mut tx, inventory.id, balance).await?;

        let movement = MovementRepository::insert(
            &mut tx,
            &NewMovement {
                location_id: req.location_id,
                staff_id: req.staff_id,
                ingredient_id: req.ingredient_id,
                quantity: req.quantity,
                movement_type: MovementType::Delivery,
                reference: req.reference.clone(),
                cost: Some(req.cost),
                revenue: None,
                notes: req.notes.clone(),
                recorded_at: self.clock.now(),
            },
        )
        .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            movement_id = movement.id,
            location_id = req.location_id,
            ingredient = %ingredient.name,
            quantity = %req.quantity,
            cost = %req.cost,
            unit_cost = %update.resolve(ingredient.cost()),
            "Delivery accepted"
        );

        Ok(movement)
    }

    // =========================================================================
    // Sell Item
    // =========================================================================

    /// Debits every ingredient of the sold recipe, or none of them.
    ///
    /// Returns one sale movement per debited ingredient, in recipe order.
    ///
    /// ## Errors
    /// * `InvalidInput` - quantity outside 1..=999
    /// * `NotFound` - no active menu item for the target at the location,
    ///   or the recipe has no ingredient lines
    /// * `InvalidState` - every recipe line has quantity zero, or the
    ///   required quantities or revenue overflow
    /// * `InsufficientInventory` - some ingredient is short (nothing is debited)
    pub async fn sell_item(&self, req: &SaleRequest) -> LedgerResult<Vec<InventoryMovement>> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        // The ingredient set is unknown until the recipe is read; lock the
        // whole location first.
        InventoryRepository::lock(&mut tx, req.location_id, &[]).await?;

        let menu_item = match req.target {
            SaleTarget::Recipe(recipe_id) => {
                MenuItemRepository::find_active_for_recipe(&mut tx, req.location_id, recipe_id)
                    .await?
            }
            SaleTarget::MenuItem(menu_item_id) => {
                MenuItemRepository::fetch_active(&mut tx, req.location_id, menu_item_id).await?
            }
        };
        let Some(menu_item) = menu_item else {
            let key = match req.target {
                SaleTarget::Recipe(id) => format!("recipe {} at location {}", id, req.location_id),
                SaleTarget::MenuItem(id) => format!("{} at location {}", id, req.location_id),
            };
            warn!(key = %key, "Sale rejected: no active menu item");
            return Err(LedgerError::not_found("Menu item", key));
        };

        let lines = RecipeRepository::fetch_ingredients(&mut tx, menu_item.recipe_id).await?;
        if lines.is_empty() {
            return Err(LedgerError::not_found("Recipe ingredients", menu_item.recipe_id));
        }

        let mut needs: Vec<Need> = Vec::new();
        for line in &lines {
            let required = line.quantity().checked_times(req.quantity).ok_or_else(|| {
                LedgerError::InvalidState(format!(
                    "required quantity of {} overflows",
                    line.ingredient_name
                ))
            })?;
            if required.is_zero() {
                continue;
            }

            match needs.iter_mut().find(|n| n.ingredient_id == line.ingredient_id) {
                Some(need) => {
                    need.required = need.required.checked_add(required).ok_or_else(|| {
                        LedgerError::InvalidState(format!(
                            "required quantity of {} overflows",
                            line.ingredient_name
                        ))
                    })?;
                }
                None => needs.push(Need {
                    ingredient_id: line.ingredient_id,
                    ingredient_name: line.ingredient_name.clone(),
                    required,
                }),
            }
        }

        if needs.is_empty() {
            return Err(LedgerError::InvalidState(format!(
                "recipe {} has no ingredient with a non-zero quantity",
                menu_item.recipe_id
            )));
        }

        let revenue = menu_item.price().checked_times(req.quantity).ok_or_else(|| {
            LedgerError::InvalidState(format!(
                "revenue for {} × {} overflows",
                req.quantity, menu_item.name
            ))
        })?;

        // Pass 1: every ingredient must be covered before anything is written.
        let mut debits = Vec::with_capacity(needs.len());
        for need in needs {
            let row =
                InventoryRepository::fetch(&mut tx, req.location_id, need.ingredient_id).await?;
            let available = row.as_ref().map(|r| r.quantity()).unwrap_or_default();

            match row {
                Some(row) if available >= need.required => {
                    debits.push(Debit {
                        need,
                        inventory_id: row.id,
                    });
                }
                _ => {
                    warn!(
                        location_id = req.location_id,
                        ingredient = %need.ingredient_name,
                        required = %need.required,
                        available = %available,
                        "Sale rejected: insufficient inventory"
                    );
                    return Err(CoreError::InsufficientInventory {
                        ingredient_id: need.ingredient_id,
                        ingredient: need.ingredient_name,
                        required: need.required,
                        available,
                    }
                    .into());
                }
            }
        }

        // Pass 2: debit and record.
        let shares = costing::split_revenue(revenue, debits.len());
        let recorded_at = self.clock.now();
        let reference = menu_item.recipe_id.to_string();

        let mut movements = Vec::with_capacity(debits.len());
        for (debit, share) in debits.iter().zip(shares) {
            InventoryRepository::add_quantity(&mut tx, debit.inventory_id, -debit.need.required)
                .await?;

            let movement = MovementRepository::insert(
                &mut tx,
                &NewMovement {
                    location_id: req.location_id,
                    staff_id: req.staff_id,
                    ingredient_id: debit.need.ingredient_id,
                    quantity: -debit.need.required,
                    movement_type: MovementType::Sale,
                    reference: Some(reference.clone()),
                    cost: None,
                    revenue: Some(share),
                    notes: req.notes.clone(),
                    recorded_at,
                },
            )
            .await?;
            movements.push(movement);
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            location_id = req.location_id,
            menu_item = %menu_item.name,
            portions = req.quantity,
            revenue = %revenue,
            ingredients = movements.len(),
            "Sale recorded"
        );

        Ok(movements)
    }

    // =========================================================================
    // Take Stock
    // =========================================================================

    /// Overwrites the balance with a physical count and records the variance.
    ///
    /// A shortfall is `waste`, valued at the ingredient's current cost.
    /// Anything else, including no change, is an `adjustment`.
    ///
    /// ## Errors
    /// * `InvalidInput` - negative count
    /// * `NotFound` - no inventory row for (location, ingredient)
    pub async fn take_stock(&self, req: &StockCountRequest) -> LedgerResult<InventoryMovement> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        InventoryRepository::lock(&mut tx, req.location_id, &[req.ingredient_id]).await?;

        let inventory = InventoryRepository::fetch(&mut tx, req.location_id, req.ingredient_id)
            .await?
            .ok_or_else(|| inventory_not_found(req.location_id, req.ingredient_id))?;

        let ingredient = IngredientRepository::fetch(&mut tx, req.ingredient_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Ingredient", req.ingredient_id))?;

        let count = costing::classify_count(inventory.quantity(), req.actual_quantity)
            .ok_or_else(|| {
                LedgerError::InvalidState(format!(
                    "count of {} differs from balance {} by more than a quantity can hold",
                    req.actual_quantity,
                    inventory.quantity()
                ))
            })?;
        let cost = match count.kind {
            MovementType::Waste => Some(costing::waste_value(count.difference, ingredient.cost())),
            _ => None,
        };

        InventoryRepository::set_quantity(&mut tx, inventory.id, req.actual_quantity).await?;

        let movement = MovementRepository::insert(
            &mut tx,
            &NewMovement {
                location_id: req.location_id,
                staff_id: req.staff_id,
                ingredient_id: req.ingredient_id,
                quantity: count.difference,
                movement_type: count.kind,
                reference: None,
                cost,
                revenue: None,
                notes: req.notes.clone(),
                recorded_at: self.clock.now(),
            },
        )
        .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            movement_id = movement.id,
            location_id = req.location_id,
            ingredient = %ingredient.name,
            expected = %inventory.quantity(),
            actual = %req.actual_quantity,
            kind = %count.kind,
            "Stock counted"
        );

        Ok(movement)
    }
}

fn inventory_not_found(location_id: LocationId, ingredient_id: IngredientId) -> LedgerError {
    LedgerError::not_found(
        "Inventory",
        format!("ingredient {} at location {}", ingredient_id, location_id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{kitchen, kitchen_with, stock_kitchen, Kitchen};
    use larder_core::MovementFilter;
    use larder_db::{DbConfig, NewMenuItem, NewRecipe};

    fn qty(milli: i64) -> Quantity {
        Quantity::from_milli(milli)
    }

    fn money(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    async fn movements_of_type(k: &Kitchen, movement_type: MovementType) -> usize {
        k.db.movements()
            .list(k.location.id, &MovementFilter::all().with_type(movement_type))
            .await
            .unwrap()
            .len()
    }

    /// Stocks the salad's ingredients with the given quantities.
    async fn stock_salad(k: &Kitchen, chicken: i64, lettuce: i64, tomato: i64) {
        k.receive(&k.chicken, qty(chicken), money(500)).await;
        k.receive(&k.lettuce, qty(lettuce), money(250)).await;
        k.receive(&k.tomato, qty(tomato), money(300)).await;
    }

    // =========================================================================
    // Deliveries
    // =========================================================================

    #[tokio::test]
    async fn test_delivery_averages_unit_cost() {
        let k = kitchen().await;

        k.receive(&k.chicken, Quantity::from_units(10), money(500)).await;
        let movement = k.receive(&k.chicken, Quantity::from_units(10), money(700)).await;

        assert_eq!(k.unit_cost(&k.chicken).await, money(600));
        assert_eq!(k.on_hand(&k.chicken).await, Quantity::from_units(20));

        assert_eq!(movement.movement_type, MovementType::Delivery);
        assert_eq!(movement.quantity(), Quantity::from_units(10));
        assert_eq!(movement.cost(), Some(money(700)));
        assert_eq!(movement.revenue(), None);
        assert_eq!(movement.staff_id, k.staff.id);
    }

    #[tokio::test]
    async fn test_delivery_into_empty_stock_takes_delivered_cost() {
        let k = kitchen().await;

        k.receive(&k.lettuce, Quantity::from_units(4), money(310)).await;

        assert_eq!(k.unit_cost(&k.lettuce).await, money(310));
    }

    #[tokio::test]
    async fn test_zero_cost_delivery_keeps_unit_cost() {
        let k = kitchen().await;
        k.receive(&k.chicken, Quantity::from_units(10), money(500)).await;

        let movement = k.receive(&k.chicken, Quantity::from_units(5), Money::zero()).await;

        assert_eq!(k.unit_cost(&k.chicken).await, money(500));
        assert_eq!(k.on_hand(&k.chicken).await, Quantity::from_units(15));
        assert_eq!(movement.cost(), Some(Money::zero()));
    }

    #[tokio::test]
    async fn test_delivery_records_reference_and_notes() {
        let k = kitchen().await;

        let movement = k
            .ledger
            .accept_delivery(
                &k.delivery(&k.tomato, qty(2500), money(280))
                    .reference("INV-2024-0113")
                    .notes("two boxes bruised"),
            )
            .await
            .unwrap();

        assert_eq!(movement.reference.as_deref(), Some("INV-2024-0113"));
        assert_eq!(movement.notes.as_deref(), Some("two boxes bruised"));
    }

    #[tokio::test]
    async fn test_delivery_rejects_bad_input_before_writing() {
        let k = kitchen().await;

        let err = k
            .ledger
            .accept_delivery(&k.delivery(&k.chicken, Quantity::zero(), money(500)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = k
            .ledger
            .accept_delivery(&k.delivery(&k.chicken, Quantity::from_units(1), money(-1)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert_eq!(movements_of_type(&k, MovementType::Delivery).await, 0);
    }

    #[tokio::test]
    async fn test_delivery_to_unstocked_ingredient_is_not_found() {
        let k = kitchen().await;

        let err = k
            .ledger
            .accept_delivery(&k.delivery(&k.basil, Quantity::from_units(2), money(120)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(k
            .db
            .inventory()
            .get(k.location.id, k.basil.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delivery_auto_provisions_when_enabled() {
        let k = kitchen_with(LedgerSettings {
            auto_provision_inventory: true,
        })
        .await;

        k.receive(&k.basil, Quantity::from_units(2), money(120)).await;

        assert_eq!(k.on_hand(&k.basil).await, Quantity::from_units(2));
        assert_eq!(k.unit_cost(&k.basil).await, money(120));

        let err = k
            .ledger
            .accept_delivery(&DeliveryRequest::new(
                k.location.id,
                k.staff.id,
                9_999,
                Quantity::from_units(1),
                money(100),
            ))
            .await
            .unwrap_err();
        match err {
            LedgerError::NotFound { entity, .. } => assert_eq!(entity, "Ingredient"),
            other => panic!("unexpected {other:?}"),
        }
        k.assert_ledger_consistent().await;
    }

    #[tokio::test]
    async fn test_delivery_that_overflows_balance_is_rejected() {
        let k = kitchen().await;
        let half = qty(i64::MAX / 2 + 1);
        k.receive(&k.chicken, half, money(1)).await;

        let err = k
            .ledger
            .accept_delivery(&k.delivery(&k.chicken, half, money(1)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        // The row still reads back and later operations still work.
        assert_eq!(k.on_hand(&k.chicken).await, half);
        assert_eq!(movements_of_type(&k, MovementType::Delivery).await, 1);

        k.ledger
            .take_stock(&StockCountRequest::new(
                k.location.id,
                k.staff.id,
                k.chicken.id,
                Quantity::from_units(3),
            ))
            .await
            .unwrap();
        assert_eq!(k.on_hand(&k.chicken).await, Quantity::from_units(3));
        k.assert_ledger_consistent().await;
    }

    #[tokio::test]
    async fn test_failed_delivery_rolls_back_cost_and_quantity() {
        let k = kitchen().await;
        k.receive(&k.chicken, Quantity::from_units(10), money(500)).await;

        let mut req = k.delivery(&k.chicken, Quantity::from_units(10), money(700));
        req.staff_id = 9_999;
        let err = k.ledger.accept_delivery(&req).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(k.on_hand(&k.chicken).await, Quantity::from_units(10));
        assert_eq!(k.unit_cost(&k.chicken).await, money(500));
        assert_eq!(movements_of_type(&k, MovementType::Delivery).await, 1);
    }

    // =========================================================================
    // Sales
    // =========================================================================

    #[tokio::test]
    async fn test_sale_debits_every_ingredient() {
        let k = kitchen().await;
        stock_salad(&k, 1_000, 1_000, 1_000).await;

        let movements = k
            .ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, k.salad.id, 2))
            .await
            .unwrap();

        let shape: Vec<(IngredientId, i64, Option<i64>)> = movements
            .iter()
            .map(|m| (m.ingredient_id, m.quantity_milli, m.revenue_cents))
            .collect();
        assert_eq!(
            shape,
            vec![
                (k.chicken.id, -300, Some(667)),
                (k.lettuce.id, -200, Some(667)),
                (k.tomato.id, -100, Some(666)),
            ]
        );
        let reference = k.salad.id.to_string();
        assert!(movements
            .iter()
            .all(|m| m.movement_type == MovementType::Sale
                && m.reference.as_deref() == Some(reference.as_str())
                && m.cost_cents.is_none()));

        assert_eq!(k.on_hand(&k.chicken).await, qty(700));
        assert_eq!(k.on_hand(&k.lettuce).await, qty(800));
        assert_eq!(k.on_hand(&k.tomato).await, qty(900));
        k.assert_ledger_consistent().await;
    }

    #[tokio::test]
    async fn test_sale_is_all_or_nothing() {
        let k = kitchen().await;
        stock_salad(&k, 1_000, 1_000, 40).await;

        let err = k
            .ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, k.salad.id, 1))
            .await
            .unwrap_err();

        match err {
            LedgerError::InsufficientInventory {
                ingredient,
                required,
                available,
                ..
            } => {
                assert_eq!(ingredient, "Tomato");
                assert_eq!(required, qty(50));
                assert_eq!(available, qty(40));
            }
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(k.on_hand(&k.chicken).await, qty(1_000));
        assert_eq!(k.on_hand(&k.lettuce).await, qty(1_000));
        assert_eq!(k.on_hand(&k.tomato).await, qty(40));
        assert_eq!(movements_of_type(&k, MovementType::Sale).await, 0);
    }

    #[tokio::test]
    async fn test_sale_can_use_exactly_what_is_left() {
        let k = kitchen().await;
        stock_salad(&k, 150, 100, 50).await;

        k.ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, k.salad.id, 1))
            .await
            .unwrap();

        assert_eq!(k.on_hand(&k.chicken).await, Quantity::zero());
        assert_eq!(k.on_hand(&k.tomato).await, Quantity::zero());
    }

    #[tokio::test]
    async fn test_sale_by_menu_item_id() {
        let k = kitchen().await;
        stock_salad(&k, 1_000, 1_000, 1_000).await;

        let movements = k
            .ledger
            .sell_item(
                &SaleRequest::menu_item(k.location.id, k.staff.id, k.salad_item.id, 1)
                    .notes("table 4"),
            )
            .await
            .unwrap();

        assert_eq!(movements.len(), 3);
        assert_eq!(movements[0].notes.as_deref(), Some("table 4"));
        let revenue: Money = movements.iter().filter_map(|m| m.revenue()).sum();
        assert_eq!(revenue, money(1000));
    }

    #[tokio::test]
    async fn test_sale_needs_active_menu_item_at_location() {
        let k = kitchen().await;
        stock_salad(&k, 1_000, 1_000, 1_000).await;

        let uptown = k
            .db
            .locations()
            .create(&larder_db::NewLocation::new("Uptown", "9 Hill Rd"))
            .await
            .unwrap();
        let err = k
            .ledger
            .sell_item(&SaleRequest::menu_item(uptown.id, k.staff.id, k.salad_item.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        k.db.menu_items().deactivate(k.salad_item.id).await.unwrap();
        let err = k
            .ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, k.salad.id, 1))
            .await
            .unwrap_err();
        match err {
            LedgerError::NotFound { entity, .. } => assert_eq!(entity, "Menu item"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(k.on_hand(&k.chicken).await, qty(1_000));
    }

    #[tokio::test]
    async fn test_sale_skips_zero_quantity_lines() {
        let k = kitchen().await;
        k.receive(&k.tomato, Quantity::from_units(1), money(300)).await;

        let cup = k
            .db
            .recipes()
            .create(
                &NewRecipe::new("Tomato Cup")
                    .line(k.tomato.id, qty(100))
                    .line(k.lettuce.id, Quantity::zero()),
            )
            .await
            .unwrap();
        k.db.menu_items()
            .create(&NewMenuItem::new(k.location.id, cup.id, "Tomato Cup", money(300)))
            .await
            .unwrap();

        let movements = k
            .ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, cup.id, 1))
            .await
            .unwrap();

        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].ingredient_id, k.tomato.id);
        assert_eq!(movements[0].revenue(), Some(money(300)));
        assert_eq!(k.on_hand(&k.lettuce).await, Quantity::zero());
    }

    #[tokio::test]
    async fn test_sale_combines_repeated_ingredient_lines() {
        let k = kitchen().await;
        k.receive(&k.tomato, Quantity::from_units(1), money(300)).await;

        let double = k
            .db
            .recipes()
            .create(
                &NewRecipe::new("Double Tomato")
                    .line(k.tomato.id, qty(100))
                    .line(k.tomato.id, qty(50)),
            )
            .await
            .unwrap();
        k.db.menu_items()
            .create(&NewMenuItem::new(k.location.id, double.id, "Double Tomato", money(450)))
            .await
            .unwrap();

        let movements = k
            .ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, double.id, 2))
            .await
            .unwrap();

        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity(), qty(-300));
        assert_eq!(movements[0].revenue(), Some(money(900)));
        assert_eq!(k.on_hand(&k.tomato).await, qty(700));
    }

    #[tokio::test]
    async fn test_sale_overflow_is_rejected_before_debiting() {
        let k = kitchen().await;
        k.receive(&k.tomato, Quantity::from_units(1), money(300)).await;

        let gilded = k
            .db
            .recipes()
            .create(&NewRecipe::new("Gilded Tomato").line(k.tomato.id, qty(10)))
            .await
            .unwrap();
        k.db.menu_items()
            .create(&NewMenuItem::new(
                k.location.id,
                gilded.id,
                "Gilded Tomato",
                money(i64::MAX / 2),
            ))
            .await
            .unwrap();
        let err = k
            .ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, gilded.id, 3))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let mountain = k
            .db
            .recipes()
            .create(
                &NewRecipe::new("Tomato Mountain")
                    .line(k.tomato.id, qty(i64::MAX / 2 + 1))
                    .line(k.tomato.id, qty(i64::MAX / 2 + 1)),
            )
            .await
            .unwrap();
        k.db.menu_items()
            .create(&NewMenuItem::new(k.location.id, mountain.id, "Tomato Mountain", money(100)))
            .await
            .unwrap();
        let err = k
            .ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, mountain.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        assert_eq!(k.on_hand(&k.tomato).await, Quantity::from_units(1));
        assert_eq!(movements_of_type(&k, MovementType::Sale).await, 0);
    }

    #[tokio::test]
    async fn test_sale_of_unusable_recipes() {
        let k = kitchen().await;

        let empty = k.db.recipes().create(&NewRecipe::new("Air")).await.unwrap();
        k.db.menu_items()
            .create(&NewMenuItem::new(k.location.id, empty.id, "Air", money(100)))
            .await
            .unwrap();
        let err = k
            .ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, empty.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let garnish = k
            .db
            .recipes()
            .create(&NewRecipe::new("Garnish").line(k.lettuce.id, Quantity::zero()))
            .await
            .unwrap();
        k.db.menu_items()
            .create(&NewMenuItem::new(k.location.id, garnish.id, "Garnish", money(50)))
            .await
            .unwrap();
        let err = k
            .ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, garnish.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_sale_of_unstocked_ingredient_reports_zero_available() {
        let k = kitchen().await;

        let pesto = k
            .db
            .recipes()
            .create(&NewRecipe::new("Pesto").line(k.basil.id, qty(500)))
            .await
            .unwrap();
        k.db.menu_items()
            .create(&NewMenuItem::new(k.location.id, pesto.id, "Pesto", money(400)))
            .await
            .unwrap();

        let err = k
            .ledger
            .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, pesto.id, 1))
            .await
            .unwrap_err();

        match err {
            LedgerError::InsufficientInventory { available, .. } => {
                assert_eq!(available, Quantity::zero())
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sale_quantity_bounds() {
        let k = kitchen().await;

        for portions in [0, -1, 1_000] {
            let err = k
                .ledger
                .sell_item(&SaleRequest::recipe(k.location.id, k.staff.id, k.salad.id, portions))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "portions {portions}");
        }
    }

    // =========================================================================
    // Stock counts
    // =========================================================================

    fn count(k: &Kitchen, ingredient: &larder_core::Ingredient, actual: Quantity) -> StockCountRequest {
        StockCountRequest::new(k.location.id, k.staff.id, ingredient.id, actual)
    }

    #[tokio::test]
    async fn test_count_below_balance_is_waste() {
        let k = kitchen().await;
        k.receive(&k.lettuce, Quantity::from_units(10), money(250)).await;

        let movement = k
            .ledger
            .take_stock(&count(&k, &k.lettuce, Quantity::from_units(5)).notes("wilted"))
            .await
            .unwrap();

        assert_eq!(movement.movement_type, MovementType::Waste);
        assert_eq!(movement.quantity(), Quantity::from_units(-5));
        assert_eq!(movement.cost(), Some(money(1250)));
        assert_eq!(movement.notes.as_deref(), Some("wilted"));
        assert_eq!(k.on_hand(&k.lettuce).await, Quantity::from_units(5));
        k.assert_ledger_consistent().await;
    }

    #[tokio::test]
    async fn test_count_above_balance_is_adjustment() {
        let k = kitchen().await;
        k.receive(&k.lettuce, Quantity::from_units(10), money(250)).await;

        let movement = k
            .ledger
            .take_stock(&count(&k, &k.lettuce, Quantity::from_units(12)))
            .await
            .unwrap();

        assert_eq!(movement.movement_type, MovementType::Adjustment);
        assert_eq!(movement.quantity(), Quantity::from_units(2));
        assert_eq!(movement.cost(), None);
        assert_eq!(k.on_hand(&k.lettuce).await, Quantity::from_units(12));
    }

    #[tokio::test]
    async fn test_count_matching_balance_records_zero_adjustment() {
        let k = kitchen().await;
        k.receive(&k.lettuce, Quantity::from_units(10), money(250)).await;

        let movement = k
            .ledger
            .take_stock(&count(&k, &k.lettuce, Quantity::from_units(10)))
            .await
            .unwrap();

        assert_eq!(movement.movement_type, MovementType::Adjustment);
        assert!(movement.quantity().is_zero());
        assert_eq!(movement.cost(), None);
    }

    #[tokio::test]
    async fn test_count_rejections() {
        let k = kitchen().await;

        let err = k
            .ledger
            .take_stock(&count(&k, &k.lettuce, qty(-1)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = k
            .ledger
            .take_stock(&count(&k, &k.basil, Quantity::from_units(1)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    // =========================================================================
    // Ledger invariant
    // =========================================================================

    #[tokio::test]
    async fn test_balances_always_equal_movement_sums() {
        let k = kitchen().await;
        stock_salad(&k, 2_000, 1_000, 800).await;

        let sale = SaleRequest::recipe(k.location.id, k.staff.id, k.salad.id, 3);
        k.ledger.sell_item(&sale).await.unwrap();
        k.ledger
            .take_stock(&count(&k, &k.lettuce, qty(650)))
            .await
            .unwrap();
        k.receive(&k.tomato, qty(400), money(320)).await;
        k.ledger.sell_item(&sale).await.unwrap();
        k.ledger
            .take_stock(&count(&k, &k.chicken, qty(1_200)))
            .await
            .unwrap();

        k.assert_ledger_consistent().await;

        let movements = k
            .db
            .movements()
            .list(k.location.id, &MovementFilter::all())
            .await
            .unwrap();
        for ingredient in [&k.chicken, &k.lettuce, &k.tomato] {
            let sum: Quantity = movements
                .iter()
                .filter(|m| m.movement.ingredient_id == ingredient.id)
                .map(|m| m.movement.quantity())
                .sum();
            assert_eq!(sum, k.on_hand(ingredient).await, "{}", ingredient.name);
        }
    }

    // =========================================================================
    // Concurrency
    // =========================================================================

    async fn file_kitchen(dir: &tempfile::TempDir) -> Kitchen {
        let db = Database::new(DbConfig::new(dir.path().join("larder.db")).max_connections(4))
            .await
            .unwrap();
        stock_kitchen(db, LedgerSettings::default()).await
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_cannot_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let k = file_kitchen(&dir).await;
        stock_salad(&k, 150, 1_000, 1_000).await;

        let req = SaleRequest::recipe(k.location.id, k.staff.id, k.salad.id, 1);
        let (a, b) = (k.ledger.clone(), k.ledger.clone());
        let (req_a, req_b) = (req.clone(), req);
        let first = tokio::spawn(async move { a.sell_item(&req_a).await });
        let second = tokio::spawn(async move { b.sell_item(&req_b).await });

        let results = [first.await.unwrap(), second.await.unwrap()];
        let sold = results.iter().filter(|r| r.is_ok()).count();
        let short = results
            .iter()
            .filter(|r| matches!(r, Err(LedgerError::InsufficientInventory { .. })))
            .count();

        assert_eq!((sold, short), (1, 1));
        assert_eq!(k.on_hand(&k.chicken).await, Quantity::zero());
        k.assert_ledger_consistent().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deliveries_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let k = file_kitchen(&dir).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = k.ledger.clone();
            let req = k.delivery(&k.chicken, Quantity::from_units(1), money(500));
            handles.push(tokio::spawn(async move { ledger.accept_delivery(&req).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(k.on_hand(&k.chicken).await, Quantity::from_units(8));
        assert_eq!(k.unit_cost(&k.chicken).await, money(500));
        k.assert_ledger_consistent().await;
    }
}
