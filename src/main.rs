//! Binary entry point for mentor.
//!
//! This binary provides the CLI for the mentor coaching agent: the
//! interactive chat REPL, the HTTP API, and the three-stage ingestion
//! pipeline.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use mentor::config::MentorConfig;
use mentor::observability::{self, LoggingConfig};
use mentor::{Result, commands};
use std::path::PathBuf;
use std::process::ExitCode;

/// Mentor - a retrieval-augmented leadership coaching agent.
#[derive(Parser)]
#[command(name = "mentor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Chat with the coach in the terminal.
    Chat,

    /// Run the HTTP chat API.
    Serve {
        /// Bind address.
        #[arg(long)]
        host: Option<String>,

        /// Bind port.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Clean raw transcripts into speaker-attributed files.
    Clean {
        /// Directory of raw transcript files.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Directory for cleaned files.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Extract Q&A records from cleaned transcripts.
    Extract {
        /// Directory of cleaned transcript files.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Record file to write.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Load the record file into the vector index.
    Index {
        /// Record file to load.
        #[arg(long)]
        records: Option<PathBuf>,
    },

    /// Show configuration and credential status.
    Status,
}

fn main() -> ExitCode {
    // A missing .env file is fine; the environment may carry the keys.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    observability::init(&LoggingConfig::from_env().verbose(cli.verbose));

    let mut config = match MentorConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(cli.command, &mut config);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Applies command-line overrides and dispatches to the handler.
fn run(command: Commands, config: &mut MentorConfig) -> Result<()> {
    match command {
        Commands::Chat => commands::chat(config),
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            commands::serve(config)
        }
        Commands::Clean { input, output } => {
            if let Some(input) = input {
                config.ingest.transcripts_dir = input;
            }
            if let Some(output) = output {
                config.ingest.cleaned_dir = output;
            }
            let processed = commands::clean(config)?;
            println!("cleaned {processed} transcript(s)");
            Ok(())
        }
        Commands::Extract { input, output } => {
            if let Some(input) = input {
                config.ingest.cleaned_dir = input;
            }
            if let Some(output) = output {
                config.ingest.records_file = output;
            }
            let count = commands::extract(config)?;
            println!(
                "extracted {count} record(s) to {}",
                config.ingest.records_file.display()
            );
            Ok(())
        }
        Commands::Index { records } => {
            if let Some(records) = records {
                config.ingest.records_file = records;
            }
            let written = commands::index(config)?;
            println!("indexed {written} record(s)");
            Ok(())
        }
        Commands::Status => commands::status(config),
    }
}
