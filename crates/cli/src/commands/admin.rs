//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin; the password comes from --password or TW_ADMIN_PASSWORD
//! TW_ADMIN_PASSWORD='...' tw-cli admin create -e owner@tonewood.shop -n "Shop Owner" -r super_admin
//!
//! # Reset a password
//! tw-cli admin set-password -e owner@tonewood.shop --password '...'
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `ADMIN_DATABASE_URL` - `PostgreSQL` connection string

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tonewood_admin::db::{self, AdminUserRepository, NewAdminUser, RepositoryError};
use tonewood_admin::services::password::{self, PasswordError};
use tonewood_core::{AdminRole, Email};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Name is required")]
    MissingName,

    /// Neither `--password` nor the environment variable was given.
    #[error("No password given: pass --password or set {}", super::PASSWORD_ENV)]
    MissingPassword,

    #[error("{0}")]
    Password(#[from] PasswordError),

    /// No admin has that email.
    #[error("No admin user with email: {0}")]
    UnknownUser(String),
}

/// Validated arguments for `admin create`.
#[derive(Debug)]
struct NewAdmin {
    email: Email,
    name: String,
    role: AdminRole,
}

fn parse_new_admin(email: &str, name: &str, role: &str) -> Result<NewAdmin, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::MissingName);
    }
    Ok(NewAdmin {
        email,
        name: name.to_owned(),
        role,
    })
}

/// Check the password rules and hash it.
fn hash_new_password(password: Option<SecretString>) -> Result<String, AdminError> {
    let password = password.ok_or(AdminError::MissingPassword)?;
    password::validate_password(password.expose_secret())?;
    Ok(password::hash_password(password.expose_secret())?)
}

async fn connect() -> Result<sqlx::PgPool, AdminError> {
    let database_url = super::database_url("ADMIN_DATABASE_URL")
        .ok_or(AdminError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Create a new admin user.
///
/// Arguments and password are checked before connecting.
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns an error for invalid input, a duplicate email or a database
/// failure.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: Option<SecretString>,
) -> Result<i32, AdminError> {
    let admin = parse_new_admin(email, name, role)?;
    let password_hash = hash_new_password(password)?;

    let pool = connect().await?;
    tracing::info!("Creating admin user: {} ({})", admin.email, admin.role);

    let user = AdminUserRepository::new(&pool)
        .create(&NewAdminUser {
            email: &admin.email,
            name: &admin.name,
            role: admin.role,
            password_hash: &password_hash,
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id.as_i32())
}

/// Replace an existing admin's password.
///
/// Sessions already open stay valid until they expire or log out.
///
/// # Errors
///
/// Returns an error for an invalid email or password, an unknown account or
/// a database failure.
pub async fn set_password(email: &str, password: Option<SecretString>) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let password_hash = hash_new_password(password)?;

    let pool = connect().await?;
    AdminUserRepository::new(&pool)
        .set_password_hash(&email, &password_hash)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UnknownUser(email.to_string()),
            other => other.into(),
        })?;

    tracing::info!("Password updated for {}", email);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_new_admin() {
        let admin = parse_new_admin("Owner@Tonewood.shop", "  Shop Owner ", "super_admin").unwrap();
        assert_eq!(admin.name, "Shop Owner");
        assert_eq!(admin.role, AdminRole::SuperAdmin);
    }

    #[test]
    fn test_parse_new_admin_rejects_bad_input() {
        assert!(matches!(
            parse_new_admin("owner@tonewood.shop", "Owner", "root"),
            Err(AdminError::InvalidRole(_))
        ));
        assert!(matches!(
            parse_new_admin("owner", "Owner", "admin"),
            Err(AdminError::InvalidEmail(_))
        ));
        assert!(matches!(
            parse_new_admin("owner@tonewood.shop", "  ", "admin"),
            Err(AdminError::MissingName)
        ));
    }

    #[test]
    fn test_password_is_required_and_checked() {
        assert!(matches!(
            hash_new_password(None),
            Err(AdminError::MissingPassword)
        ));
        assert!(matches!(
            hash_new_password(Some(SecretString::from("short"))),
            Err(AdminError::Password(PasswordError::Weak(_)))
        ));

        let hash = hash_new_password(Some(SecretString::from("rosewood-fretboard"))).unwrap();
        assert!(password::verify_password("rosewood-fretboard", &hash).is_ok());
    }
}
