//! Shared fixtures for ledger and report tests.

use chrono::{DateTime, Utc};

use larder_core::{
    Ingredient, InventoryMovement, Location, MenuItem, Money, Quantity, Recipe, Staff,
};
use larder_db::{
    Database, DbConfig, NewIngredient, NewLocation, NewMenuItem, NewRecipe, NewStaff,
};

use crate::clock::FixedClock;
use crate::config::LedgerSettings;
use crate::ledger::{DeliveryRequest, LedgerService};

/// A small restaurant: one location with a cook, three stocked ingredients
/// (all at zero), one unstocked ingredient, and a chicken salad on the menu.
pub struct Kitchen {
    pub db: Database,
    pub ledger: LedgerService,
    pub location: Location,
    pub staff: Staff,
    pub lettuce: Ingredient,
    pub tomato: Ingredient,
    pub chicken: Ingredient,
    /// Exists but has no inventory row at the location.
    pub basil: Ingredient,
    /// chicken 0.150, lettuce 0.100, tomato 0.050
    pub salad: Recipe,
    /// Chicken Salad at $10.00.
    pub salad_item: MenuItem,
}

pub async fn kitchen() -> Kitchen {
    kitchen_with(LedgerSettings::default()).await
}

pub async fn kitchen_with(settings: LedgerSettings) -> Kitchen {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    stock_kitchen(db, settings).await
}

/// Builds the kitchen on an existing database.
pub async fn stock_kitchen(db: Database, settings: LedgerSettings) -> Kitchen {
    let location = db
        .locations()
        .create(&NewLocation::new("Downtown", "1 Main St"))
        .await
        .unwrap();
    let staff = db
        .staff()
        .create(&NewStaff::new(location.id, "Ana").role("cook"))
        .await
        .unwrap();

    let ingredients = db.ingredients();
    let lettuce = ingredients
        .create(&NewIngredient::new("Lettuce", Money::from_cents(250)).unit("kg"))
        .await
        .unwrap();
    let tomato = ingredients
        .create(&NewIngredient::new("Tomato", Money::from_cents(300)).unit("kg"))
        .await
        .unwrap();
    let chicken = ingredients
        .create(&NewIngredient::new("Chicken", Money::from_cents(500)).unit("kg"))
        .await
        .unwrap();
    let basil = ingredients
        .create(&NewIngredient::new("Basil", Money::from_cents(100)).unit("bunch"))
        .await
        .unwrap();

    for ingredient in [&lettuce, &tomato, &chicken] {
        db.inventory()
            .provision(location.id, ingredient.id)
            .await
            .unwrap();
    }

    let salad = db
        .recipes()
        .create(
            &NewRecipe::new("Chicken Salad")
                .line(chicken.id, Quantity::from_milli(150))
                .line(lettuce.id, Quantity::from_milli(100))
                .line(tomato.id, Quantity::from_milli(50)),
        )
        .await
        .unwrap();
    let salad_item = db
        .menu_items()
        .create(&NewMenuItem::new(
            location.id,
            salad.id,
            "Chicken Salad",
            Money::from_cents(1000),
        ))
        .await
        .unwrap();

    Kitchen {
        ledger: LedgerService::new(db.clone(), settings),
        db,
        location,
        staff,
        lettuce,
        tomato,
        chicken,
        basil,
        salad,
        salad_item,
    }
}

impl Kitchen {
    /// A ledger whose movements are stamped at `time`.
    pub fn ledger_at(&self, time: DateTime<Utc>) -> LedgerService {
        self.ledger.clone().with_clock(FixedClock::new(time))
    }

    pub fn delivery(&self, ingredient: &Ingredient, quantity: Quantity, cost: Money) -> DeliveryRequest {
        DeliveryRequest::new(self.location.id, self.staff.id, ingredient.id, quantity, cost)
    }

    /// Delivers stock and returns the movement.
    pub async fn receive(
        &self,
        ingredient: &Ingredient,
        quantity: Quantity,
        cost: Money,
    ) -> InventoryMovement {
        self.ledger
            .accept_delivery(&self.delivery(ingredient, quantity, cost))
            .await
            .unwrap()
    }

    pub async fn on_hand(&self, ingredient: &Ingredient) -> Quantity {
        self.db
            .inventory()
            .get(self.location.id, ingredient.id)
            .await
            .unwrap()
            .map(|row| row.quantity())
            .unwrap_or_default()
    }

    pub async fn unit_cost(&self, ingredient: &Ingredient) -> Money {
        self.db
            .ingredients()
            .get_by_id(ingredient.id)
            .await
            .unwrap()
            .unwrap()
            .cost()
    }

    /// Every ingredient's balance agrees with the sum of its movements.
    pub async fn assert_ledger_consistent(&self) {
        let balances = self.db.movements().balances(self.location.id).await.unwrap();
        for balance in &balances {
            assert!(
                balance.is_consistent(),
                "{} drifted by {}",
                balance.ingredient_name,
                balance.drift()
            );
        }
    }
}
