//! Emporium CLI - migrations, admin users and data management.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! em-cli migrate
//!
//! # Create admin user
//! em-cli admin create -e admin@example.com -n "Admin Name" -r super_admin -p '...'
//!
//! # Export tables to ./exports (one file per table)
//! em-cli export --format csv --out-dir ./exports brand product
//!
//! # Import fixtures from ./fixtures (every table with a file)
//! em-cli import
//!
//! # Sync the media library with blob storage
//! em-cli media sync --direction both
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "em-cli")]
#[command(author, version, about = "Emporium CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run admin database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Export tables to files
    Export {
        /// Output format (`json`, `csv`, `xml`)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Directory to write files into
        #[arg(short, long, default_value = "./exports")]
        out_dir: PathBuf,

        /// Write a single combined file instead of one per table
        #[arg(short, long)]
        combined: bool,

        /// Tables to export (all when omitted)
        tables: Vec<String>,
    },
    /// Import JSON fixture files into the database
    Import {
        /// Directory holding `<table>.json` files (defaults to `FIXTURES_DIR`)
        #[arg(short, long)]
        source_dir: Option<PathBuf>,

        /// Tables to import (all when omitted)
        tables: Vec<String>,
    },
    /// Manage the media library
    Media {
        #[command(subcommand)]
        action: MediaAction,
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

        /// Password (at least 12 characters)
        #[arg(short, long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum MediaAction {
    /// Copy files between the local library and blob storage
    Sync {
        #[arg(short, long, value_enum, default_value_t = Direction::Both)]
        direction: Direction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Upload,
    Download,
    Both,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::admin().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create_user(&email, &name, &role, &password).await?;
            }
        },
        Commands::Export {
            format,
            out_dir,
            combined,
            tables,
        } => {
            commands::export::run(&format, &out_dir, combined, &tables).await?;
        }
        Commands::Import { source_dir, tables } => {
            commands::import::run(source_dir, &tables).await?;
        }
        Commands::Media { action } => match action {
            MediaAction::Sync { direction } => {
                let direction = match direction {
                    Direction::Upload => emporium_admin::services::media::SyncDirection::Upload,
                    Direction::Download => emporium_admin::services::media::SyncDirection::Download,
                    Direction::Both => emporium_admin::services::media::SyncDirection::Both,
                };
                commands::media::sync(direction).await?;
            }
        },
    }
    Ok(())
}
