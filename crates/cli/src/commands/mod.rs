//! `tw-cli` subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Environment variable the password for `admin create` and
/// `admin set-password` can be read from.
pub const PASSWORD_ENV: &str = "TW_ADMIN_PASSWORD";

/// Read the database URL from `DATABASE_URL`, falling back to `fallback`.
pub(crate) fn database_url(fallback: &'static str) -> Option<SecretString> {
    std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var(fallback))
        .ok()
        .map(SecretString::from)
}
