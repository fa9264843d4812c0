//! StepUp CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! stepup-cli migrate
//!
//! # Create an admin account
//! stepup-cli admin create -e admin@stepup.id -n "Admin Name" -p 'long-random-password'
//!
//! # Load catalog products from a JSON array
//! stepup-cli seed products products.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin accounts
//! - `seed products` - Bulk-insert catalog products

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stepup-cli")]
#[command(author, version, about = "StepUp CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin password (min 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert products from a JSON file, skipping codes that already exist
    Products {
        /// Path to a JSON array of products
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

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
                commands::admin::create_admin(&email, &name, &password).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => {
                let report = commands::seed::products(&file).await?;
                tracing::info!(
                    inserted = report.inserted,
                    skipped = report.skipped,
                    "Seeding complete"
                );
            }
        },
    }
    Ok(())
}
