//! Kilala Eye CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! kl-cli migrate
//!
//! # Create an admin (or promote an existing user and reset the password)
//! kl-cli admin create -e admin@kilalaeye.vn -n "Quản trị" -p 'mat-khau-dai'
//!
//! # Grant or revoke the admin role
//! kl-cli admin promote -e staff@kilalaeye.vn
//! kl-cli admin demote -e staff@kilalaeye.vn
//!
//! # Load the sample catalog
//! kl-cli seed catalog -f seed/catalog.yaml
//! ```
//!
//! Every command reads `DATABASE_URL` (a `.env` file is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "kl-cli")]
#[command(author, version, about = "Kilala Eye CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load data from YAML files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin user, or promote an existing user and reset the password
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Login password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
    /// Grant the admin role to an existing user
    Promote {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke the admin role
    Demote {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert categories, collections, tags and products by slug
    Catalog {
        /// Path to the catalog YAML file
        #[arg(short, long, default_value = "seed/catalog.yaml")]
        file: String,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kilala_cli=info,kilala_admin=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, SecretString::from(password)).await?;
            }
            AdminAction::Promote { email } => commands::admin::promote(&email).await?,
            AdminAction::Demote { email } => commands::admin::demote(&email).await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => {
                commands::seed::catalog(&file).await?;
            }
        },
    }
    Ok(())
}
