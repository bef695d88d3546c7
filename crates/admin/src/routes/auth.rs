//! Authentication route handlers for admin.
//!
//! Email and password login against `admin.admin_users`. Unknown emails and
//! wrong passwords get the same 401 and take the same time.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tonewood_core::{Email, ValidationErrors};
use tower_sessions::Session;
use tracing::instrument;

use super::ApiJson;
use crate::db::AdminUserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::{AdminUser, CurrentAdmin};
use crate::services::password::{self, PasswordError};
use crate::state::AppState;

const INVALID_LOGIN: &str = "invalid email or password";

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// `POST /auth/login`
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AdminUser>> {
    let mut errors = ValidationErrors::new();
    errors.add_if(body.email.trim().is_empty(), "email", "is required");
    errors.add_if(body.password.is_empty(), "password", "is required");
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let unauthorized = || AppError::Unauthorized(INVALID_LOGIN.to_string());

    let account = match Email::parse(&body.email) {
        Ok(email) => AdminUserRepository::new(state.pool())
            .find_for_login(&email)
            .await?,
        Err(_) => None,
    };

    let password = body.password;
    let verified = tokio::task::spawn_blocking(move || match account {
        Some((user, hash)) => password::verify_password(&password, &hash).map(|()| user),
        None => {
            password::verify_against_dummy(&password);
            Err(PasswordError::InvalidCredentials)
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("password check panicked: {e}")))?;

    let user = match verified {
        Ok(user) => user,
        Err(PasswordError::InvalidCredentials) => {
            tracing::warn!("Failed admin login");
            return Err(unauthorized());
        }
        Err(err) => return Err(err.into()),
    };

    // Fresh id on privilege change
    session.cycle_id().await?;
    set_current_admin(&session, &CurrentAdmin::from(&user)).await?;
    set_sentry_user(user.id.as_i32(), Some(user.email.as_str()));
    tracing::info!(admin_id = %user.id, role = %user.role, "Admin logged in");

    Ok(Json(user))
}

/// `POST /auth/logout`
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/me`
///
/// Re-reads the account so a deleted admin is logged out and a role change
/// takes effect without logging in again.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn me(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<AdminUser>> {
    let Some(user) = AdminUserRepository::new(state.pool())
        .get_by_id(admin.id)
        .await?
    else {
        clear_current_admin(&session).await?;
        return Err(AppError::Unauthorized("account no longer exists".to_string()));
    };

    let current = CurrentAdmin::from(&user);
    if current != admin {
        set_current_admin(&session, &current).await?;
    }
    Ok(Json(user))
}
