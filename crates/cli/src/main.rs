//! GeekShop CLI - database migrations, seeding and user management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! gs-cli migrate
//!
//! # Replace the catalog with a JSON seed and create a superuser
//! gs-cli fill fixtures/ -u admin -p 'long-password'
//!
//! # Create a superuser
//! gs-cli user create-superuser -u admin -p 'long-password' -e admin@geekshop.local
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `fill` - Load `categories.json` and `products.json`
//! - `user create-superuser` - Create a superuser account

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gs-cli")]
#[command(author, version, about = "GeekShop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Replace the catalog with a JSON seed and create a superuser
    Fill {
        /// Directory holding `categories.json` and `products.json`
        dir: PathBuf,

        /// Superuser login name
        #[arg(short, long, default_value = "admin")]
        username: String,

        /// Superuser password
        #[arg(short, long, env = "GEEKSHOP_SUPERUSER_PASSWORD")]
        password: String,

        /// Superuser email address
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new superuser
    CreateSuperuser {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(short, long, env = "GEEKSHOP_SUPERUSER_PASSWORD")]
        password: String,

        /// Email address
        #[arg(short, long)]
        email: Option<String>,
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
        Commands::Fill {
            dir,
            username,
            password,
            email,
        } => {
            commands::fill::run(&dir, &username, &password, email.as_deref()).await?;
        }
        Commands::User { action } => match action {
            UserAction::CreateSuperuser {
                username,
                password,
                email,
            } => {
                commands::user::create_superuser(&username, &password, email.as_deref()).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fill_defaults_username() {
        let cli = Cli::try_parse_from(["gs-cli", "fill", "fixtures", "-p", "secret-pass"])
            .unwrap_or_else(|e| panic!("parse failed: {e}"));

        let Commands::Fill {
            dir,
            username,
            email,
            ..
        } = cli.command
        else {
            panic!("expected fill command");
        };
        assert_eq!(dir, PathBuf::from("fixtures"));
        assert_eq!(username, "admin");
        assert!(email.is_none());
    }

    #[test]
    fn test_create_superuser_args() {
        let cli = Cli::try_parse_from([
            "gs-cli",
            "user",
            "create-superuser",
            "-u",
            "root",
            "-p",
            "secret-pass",
            "-e",
            "root@geekshop.local",
        ])
        .unwrap_or_else(|e| panic!("parse failed: {e}"));

        assert!(matches!(
            cli.command,
            Commands::User {
                action: UserAction::CreateSuperuser { ref username, ref email, .. }
            } if username == "root" && email.as_deref() == Some("root@geekshop.local")
        ));
    }
}
