//! # Staff Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use larder_core::{LocationId, Staff, StaffId};

/// Input for creating a staff member.
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub location_id: LocationId,
    pub name: String,
    pub role: Option<String>,
}

impl NewStaff {
    pub fn new(location_id: LocationId, name: impl Into<String>) -> Self {
        NewStaff {
            location_id,
            name: name.into(),
            role: None,
        }
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// Repository for staff database operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Creates a staff member.
    ///
    /// Fails with `ForeignKeyViolation` if the location does not exist.
    pub async fn create(&self, new: &NewStaff) -> DbResult<Staff> {
        debug!(location_id = new.location_id, name = %new.name, "Creating staff member");

        let result =
            sqlx::query("INSERT INTO staff (location_id, name, role) VALUES (?1, ?2, ?3)")
                .bind(new.location_id)
                .bind(&new.name)
                .bind(&new.role)
                .execute(&self.pool)
                .await?;

        Ok(Staff {
            id: result.last_insert_rowid(),
            location_id: new.location_id,
            name: new.name.clone(),
            role: new.role.clone(),
            is_active: true,
        })
    }

    /// Gets an active staff member by ID.
    pub async fn get_by_id(&self, id: StaffId) -> DbResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(
            r#"
            SELECT id, location_id, name, role, is_active
            FROM staff
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(staff)
    }

    /// Lists a location's active staff ordered by name.
    pub async fn list_by_location(&self, location_id: LocationId) -> DbResult<Vec<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(
            r#"
            SELECT id, location_id, name, role, is_active
            FROM staff
            WHERE location_id = ?1 AND is_active = 1
            ORDER BY name, id
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(staff)
    }

    pub async fn deactivate(&self, id: StaffId) -> DbResult<()> {
        let result = sqlx::query("UPDATE staff SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::fixture;

    #[tokio::test]
    async fn test_list_by_location_filters_inactive() {
        let fx = fixture().await;
        let repo = fx.db.staff();

        let bo = repo
            .create(&NewStaff::new(fx.location.id, "Bo"))
            .await
            .unwrap();
        repo.deactivate(bo.id).await.unwrap();

        let staff = repo.list_by_location(fx.location.id).await.unwrap();
        assert_eq!(staff, vec![fx.staff.clone()]);
        assert!(repo.get_by_id(bo.id).await.unwrap().is_none());
        assert_eq!(staff[0].role.as_deref(), Some("cook"));
    }

    #[tokio::test]
    async fn test_unknown_location_is_rejected() {
        let fx = fixture().await;

        let err = fx
            .db
            .staff()
            .create(&NewStaff::new(999, "Nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
