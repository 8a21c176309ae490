//! Credbridge CLI - inspect and query credential configuration files
//!
//! Run `credbridge --help` for usage information.

use clap::{Parser, Subcommand};
use credbridge::config::ConfigParser;
use credbridge::resolver::CredentialResolver;
use credbridge::LookupResult;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "credbridge",
    about = "Inspect and query protocol bridge credential files",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a credential file and report what it contains
    Check {
        /// Credential configuration file (structured JSON or legacy key-value)
        file: PathBuf,
    },

    /// Resolve credentials for a destination server
    Lookup {
        /// Credential configuration file
        file: PathBuf,

        /// Destination server host
        host: String,

        /// Requester identity to match against the entry's pattern
        #[arg(short, long)]
        requester: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    match cli.command {
        Commands::Check { file } => {
            let outcome = ConfigParser::new().verbose(cli.verbose > 0).load(&file);
            if outcome.table.is_empty() {
                println!("no credential entries loaded from {}", file.display());
                return;
            }
            for entry in outcome.table.entries() {
                println!(
                    "{}  {}  requester={}",
                    entry.server_host,
                    entry.auth.kind(),
                    entry.requester_pattern.as_deref().unwrap_or("*"),
                );
            }
            println!("{} entries loaded", outcome.table.len());
        }

        Commands::Lookup {
            file,
            host,
            requester,
        } => {
            let outcome = ConfigParser::new().verbose(cli.verbose > 0).load(&file);
            let resolver = CredentialResolver::new(Arc::new(outcome.table));
            match resolver.resolve_by_endpoint(&host, requester.as_deref()) {
                LookupResult::Found(auth) => {
                    println!("{}: {} login as {}", host, auth.kind(), auth.username());
                }
                LookupResult::NotFound => {
                    println!("{}: no mapping found", host);
                    std::process::exit(1);
                }
            }
        }
    }
}
