//! Rowbind command-line tool
//!
//! Loads a mapping project from its manifest and reports on the linked
//! model: configuration errors, type capability tables, and statements.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "rowbind")]
#[command(about = "Validate and inspect rowbind mapping projects", long_about = None)]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every source and report configuration errors
    Check {
        /// Manifest file or the directory holding rowbind.toml
        #[arg(short, long, default_value = ".")]
        manifest: PathBuf,
    },

    /// Show the readable and writable properties of a type
    Inspect {
        /// Type name or alias
        type_name: String,
        /// Manifest file or the directory holding rowbind.toml
        #[arg(short, long, default_value = ".")]
        manifest: PathBuf,
    },

    /// List committed statements
    Statements {
        /// Manifest file or the directory holding rowbind.toml
        #[arg(short, long, default_value = ".")]
        manifest: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { manifest } => commands::check::execute(&manifest),
        Commands::Inspect { type_name, manifest } => commands::inspect::execute(&manifest, &type_name),
        Commands::Statements { manifest } => commands::statements::execute(&manifest),
    }
}

/// `-v` wins over `RUST_LOG`; with neither only warnings are shown
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
