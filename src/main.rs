//! # PDF Analyzer CLI (`pdf-analyzer`)
//!
//! Uploads PDFs, extracts machine-component mentions from their text, and
//! serves or exports the results.
//!
//! ## Usage
//!
//! ```bash
//! pdf-analyzer --config ./config/analyzer.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pdf-analyzer init` | Create the SQLite database and schema |
//! | `pdf-analyzer serve` | Start the HTTP API |
//! | `pdf-analyzer upload <path>` | Store a PDF and print its id |
//! | `pdf-analyzer analyze <id>` | Run component extraction on a stored PDF |
//! | `pdf-analyzer results <id>` | Print the components found so far |
//! | `pdf-analyzer export <id>` | Write results as JSON or CSV |
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. The default filter is
//! `pdf_analyzer=info,tower_http=info`; override it with `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pdf_analyzer::{cli, config, migrate, server};

/// PDF Analyzer: extract spindles, motors, axes, controllers, and tool
/// changers from uploaded machine manuals.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file is only tolerated by `init`.
#[derive(Parser)]
#[command(name = "pdf-analyzer", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/analyzer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent. Falls back to built-in defaults when the config file does
    /// not exist.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Upload a PDF file.
    Upload {
        /// Path to the `.pdf` file.
        path: PathBuf,
    },

    /// Extract components from an uploaded PDF.
    Analyze {
        /// PDF id returned by `upload`.
        id: i64,
    },

    /// Show the components recorded for a PDF.
    Results {
        /// PDF id.
        id: i64,
    },

    /// Export analysis results.
    Export {
        /// PDF id.
        id: i64,

        /// Output format: `json` or `csv`.
        #[arg(long, default_value = "json")]
        format: String,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pdf_analyzer=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = match &cli.command {
        Commands::Init if !cli.config.exists() => config::Config::minimal(),
        _ => config::load_config(&cli.config)?,
    };

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Upload { path } => {
            cli::run_upload(&cfg, &path).await?;
        }
        Commands::Analyze { id } => {
            cli::run_analyze(&cfg, id).await?;
        }
        Commands::Results { id } => {
            cli::run_results(&cfg, id).await?;
        }
        Commands::Export { id, format, output } => {
            cli::run_export(&cfg, id, &format, output.as_deref()).await?;
        }
    }

    Ok(())
}
