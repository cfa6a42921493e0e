//! # Location Repository
//!
//! Locations are never deleted physically: movements reference them forever.
//! `deactivate` hides a location from listings and lookups.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use larder_core::{Location, LocationId};

/// Input for creating a location.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl NewLocation {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        NewLocation {
            name: name.into(),
            address: address.into(),
            phone: None,
            email: None,
        }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Repository for location database operations.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    /// Creates a new LocationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    pub async fn create(&self, new: &NewLocation) -> DbResult<Location> {
        debug!(name = %new.name, "Creating location");

        let result = sqlx::query(
            "INSERT INTO locations (name, address, phone, email) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&new.name)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.email)
        .execute(&self.pool)
        .await?;

        Ok(Location {
            id: result.last_insert_rowid(),
            name: new.name.clone(),
            address: new.address.clone(),
            phone: new.phone.clone(),
            email: new.email.clone(),
            is_active: true,
        })
    }

    /// Gets an active location by ID.
    pub async fn get_by_id(&self, id: LocationId) -> DbResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, address, phone, email, is_active
            FROM locations
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    /// Lists active locations ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, address, phone, email, is_active
            FROM locations
            WHERE is_active = 1
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    pub async fn deactivate(&self, id: LocationId) -> DbResult<()> {
        let result = sqlx::query("UPDATE locations SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Location", id));
        }

        debug!(id, "Location deactivated");
        Ok(())
    }
}
