//! bookcheck CLI - Main Entry Point
//!
//! Validates API records against declarative schemas and drives the
//! booking API from the command line.

use clap::{Parser, Subcommand};

use bookcheck_cli::commands::{generate, ping, schema, validate};
use bookcheck_cli::output;

/// bookcheck - schema-driven record validation for booking APIs
#[derive(Parser)]
#[command(name = "bookcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an actual record against an expected one
    Validate(validate::ValidateArgs),

    /// Inspect schema documents
    #[command(subcommand)]
    Schema(schema::SchemaCommands),

    /// Generate random booking payloads
    Generate(generate::GenerateArgs),

    /// Check that the booking API is up
    Ping(ping::PingArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate(args) => {
            if !validate::execute(args, cli.format)? {
                std::process::exit(1);
            }
        }
        Commands::Schema(cmd) => schema::execute(cmd, cli.format)?,
        Commands::Generate(args) => generate::execute(args, cli.format)?,
        Commands::Ping(args) => {
            if !ping::execute(args).await? {
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("bookcheck v{}", env!("CARGO_PKG_VERSION"));
            println!("Record validator v{}", bookcheck_common::VERSION);
        }
    }

    Ok(())
}
