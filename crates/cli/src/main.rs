//! Tonewood CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! tw-cli migrate
//!
//! # Create an admin user (password from --password or TW_ADMIN_PASSWORD)
//! tw-cli admin create -e owner@tonewood.shop -n "Shop Owner" -r super_admin
//!
//! # Load the catalog
//! tw-cli seed catalog seed/catalog.yaml --clear
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` / `admin set-password` - Manage admin users
//! - `seed catalog` / `seed stats` - Load and inspect shop data

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "tw-cli")]
#[command(author, version, about = "Tonewood CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        /// List migrations and whether they are applied, without running any
        #[arg(long)]
        status: bool,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed and inspect shop data
    Seed {
        #[command(subcommand)]
        action: SeedAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Initial password (at least 12 characters)
        #[arg(long, env = commands::PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },
    /// Replace an admin user's password
    SetPassword {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// New password (at least 12 characters)
        #[arg(long, env = commands::PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum SeedAction {
    /// Insert products and services from a YAML file
    Catalog {
        /// Path to the YAML catalog
        file: String,

        /// Delete existing products (and unbooked services) first
        #[arg(long)]
        clear: bool,
    },
    /// Show row counts
    Stats,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Before parsing so `.env` can supply TW_ADMIN_PASSWORD
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { status: true } => commands::migrate::status().await?,
        Commands::Migrate { status: false } => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create_user(&email, &name, &role, password.map(SecretString::from))
                    .await?;
            }
            AdminAction::SetPassword { email, password } => {
                commands::admin::set_password(&email, password.map(SecretString::from)).await?;
            }
        },
        Commands::Seed { action } => match action {
            SeedAction::Catalog { file, clear } => commands::seed::catalog(&file, clear).await?,
            SeedAction::Stats => commands::seed::stats().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
