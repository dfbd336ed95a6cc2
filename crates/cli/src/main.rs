//! # aquifer: ask the groundwater database in plain language
//!
//! This is the main entry point for the `aquifer` command-line interface.

mod ask;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate SQL for each question, run it and print the first rows
    Ask(ask::AskArgs),
    /// Print only the SQL generated for a question
    Sql(ask::SqlArgs),
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only results.
    let subscriber = fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match &cli.command {
        Commands::Ask(args) => ask::handle_ask(args).await,
        Commands::Sql(args) => ask::handle_sql(args).await,
    }
}
