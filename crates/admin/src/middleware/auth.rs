//! Authentication extractors for admin.
//!
//! Every `/api` handler takes one of these: [`RequireAdmin`] for reads,
//! [`RequireWriter`] for anything that changes data. Viewers can read but
//! get 403 on writes.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires a logged-in admin of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> String {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Extractor that requires a logged-in admin allowed to write.
pub struct RequireWriter(pub CurrentAdmin);

async fn current_admin(parts: &Parts) -> Result<CurrentAdmin, AppError> {
    // Set by SessionManagerLayer
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

    let admin: CurrentAdmin = session
        .get(session_keys::CURRENT_ADMIN)
        .await?
        .ok_or_else(|| AppError::Unauthorized("login required".to_string()))?;

    set_sentry_user(admin.id.as_i32(), Some(admin.email.as_str()));
    Ok(admin)
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_admin(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireWriter
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        if !admin.role.can_write() {
            tracing::warn!(admin_id = %admin.id, role = %admin.role, "Write refused");
            return Err(AppError::Forbidden(format!(
                "the {} role is read-only",
                admin.role
            )));
        }
        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// The session id is rotated first so a pre-login id can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the session entirely (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
