//! Hexshop CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! hexshop migrate
//!
//! # Load the demo catalog
//! hexshop seed --file seed/catalog.yaml
//!
//! # Create a customer account
//! HEXSHOP_NEW_USER_PASSWORD=... hexshop user create -e ada@example.com --first-name Ada --surname Lovelace
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hexshop")]
#[command(author, version, about = "Hexshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(short, long, default_value = "seed/catalog.yaml")]
        file: String,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user (password from `HEXSHOP_NEW_USER_PASSWORD`)
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(long)]
        first_name: String,

        /// Surname
        #[arg(long)]
        surname: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                first_name,
                surname,
            } => commands::user::create(&email, &first_name, &surname).await?,
        },
    }
    Ok(())
}
