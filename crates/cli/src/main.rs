//! Canvas Gallery CLI - Database migrations, seeding and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront migrations
//! gallery-cli migrate
//!
//! # Load the sample catalogue into an empty database
//! gallery-cli seed
//!
//! # Give an existing account the ADMIN role
//! gallery-cli admin promote -e owner@canvasgallery.in
//! ```
//!
//! All commands read `GALLERY_DATABASE_URL` (or `DATABASE_URL`), loading a
//! `.env` file first when present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gallery-cli")]
#[command(author, version, about = "Canvas Gallery CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert the sample catalogue
    Seed {
        /// Seed even when paintings already exist
        #[arg(long)]
        force: bool,
    },
    /// Manage user roles
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant the ADMIN role to a registered user
    Promote {
        /// Email the user registered with
        #[arg(short, long)]
        email: String,
    },
    /// Return an admin to the CUSTOMER role
    Demote {
        /// Email the user registered with
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Seed { force } => {
            commands::seed::paintings(force).await?;
        }
        Commands::Admin { action } => match action {
            AdminAction::Promote { email } => {
                commands::admin::set_role(&email, canvas_gallery_core::UserRole::Admin).await?;
            }
            AdminAction::Demote { email } => {
                commands::admin::set_role(&email, canvas_gallery_core::UserRole::Customer)
                    .await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_promote() {
        let cli = Cli::try_parse_from(["gallery-cli", "admin", "promote", "-e", "a@b.in"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Admin {
                action: AdminAction::Promote { .. }
            })
        ));
    }

    #[test]
    fn test_seed_force_flag() {
        let cli = Cli::try_parse_from(["gallery-cli", "seed", "--force"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Seed { force: true })
        ));
    }
}
