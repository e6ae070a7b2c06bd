//! Storehost CLI - Tenant resolution and snapshot inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a hostname the way the storefront would
//! storehost resolve tienda.shopmesh.io
//!
//! # Fetch a rendered page and print its hydration snapshot
//! storehost snapshot https://tienda.shopmesh.io/products
//! ```
//!
//! # Commands
//!
//! - `resolve` - Resolve a hostname to a tenant and print the state as JSON
//! - `snapshot` - Decode the hydration snapshot embedded in a rendered page

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "storehost")]
#[command(author, version, about = "Storehost CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a hostname to a tenant
    Resolve {
        /// Hostname as a visitor would type it (port allowed)
        hostname: String,
    },
    /// Print the hydration snapshot of a rendered page
    Snapshot {
        /// Page URL
        url: String,

        /// Send a session cookie with the request
        #[arg(short, long)]
        session: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,storehost=info".into()),
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
    let output = match cli.command {
        Commands::Resolve { hostname } => commands::resolve::run(&hostname).await?,
        Commands::Snapshot { url, session } => {
            commands::snapshot::run(&url, session.as_deref()).await?
        }
    };

    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}
