//! Urbannue CLI - Database migrations and shop management.
//!
//! # Usage
//!
//! ```bash
//! # Run dashboard database migrations
//! urbannue migrate
//!
//! # List connected shops
//! urbannue shops list
//!
//! # Delete the stored token of a shop
//! urbannue shops forget brand-name.myshopify.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "urbannue")]
#[command(author, version, about = "Urbannue Pro CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage connected shops
    Shops {
        #[command(subcommand)]
        action: ShopsAction,
    },
}

#[derive(Subcommand)]
enum ShopsAction {
    /// List connected shops (tokens are not shown)
    List,
    /// Delete the stored access token of a shop
    Forget {
        /// Store domain or handle
        shop: String,
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
        Commands::Shops { action } => match action {
            ShopsAction::List => commands::shops::list().await?,
            ShopsAction::Forget { shop } => commands::shops::forget(&shop).await?,
        },
    }
    Ok(())
}
