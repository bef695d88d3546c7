//! Admin user repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tonewood_core::{AdminRole, AdminUserId, Email};

use super::RepositoryError;
use crate::models::AdminUser;

/// Internal row type carrying the password hash, which never leaves this
/// module except through [`AdminUserRepository::find_for_login`].
#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: AdminUserId,
    email: Email,
    name: String,
    role: AdminRole,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AdminUserRow {
    fn split(self) -> (AdminUser, String) {
        (
            AdminUser {
                id: self.id,
                email: self.email,
                name: self.name,
                role: self.role,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            self.password_hash,
        )
    }
}

/// Fields needed to create an admin account.
#[derive(Debug)]
pub struct NewAdminUser<'a> {
    pub email: &'a Email,
    pub name: &'a str,
    pub role: AdminRole,
    /// Argon2 PHC string.
    pub password_hash: &'a str,
}

/// Repository for admin user database operations.
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up an account and its password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_login(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, email, name, role, password_hash, created_at, updated_at
            FROM admin.admin_users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(AdminUserRow::split))
    }

    /// Get an admin user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let user = sqlx::query_as::<_, AdminUser>(
            r"
            SELECT id, email, name, role, created_at, updated_at
            FROM admin.admin_users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Create a new admin user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(&self, new: &NewAdminUser<'_>) -> Result<AdminUser, RepositoryError> {
        sqlx::query_as::<_, AdminUser>(
            r"
            INSERT INTO admin.admin_users (email, name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, role, created_at, updated_at
            ",
        )
        .bind(new.email)
        .bind(new.name)
        .bind(new.role)
        .bind(new.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::unique_as_conflict(e, "An admin with that email already exists")
        })
    }

    /// Replace an account's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has that email.
    pub async fn set_password_hash(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE admin.admin_users
            SET password_hash = $2, updated_at = NOW()
            WHERE email = $1
            ",
        )
        .bind(email)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
