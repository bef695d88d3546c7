//! Admin user domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tonewood_core::{AdminRole, AdminUserId, Email};

/// A staff account, without its password hash.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
