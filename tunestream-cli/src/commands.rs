//! CLI command implementations

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use tunestream_core::config::parse_chunk_size;
use tunestream_core::{LibraryCatalog, MediaCatalog, TuneStreamConfig};
use tunestream_web::run_server;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the streaming server
    Server {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory holding uploaded MP3 files
        #[arg(short, long)]
        library: Option<PathBuf>,
        /// Bytes read per body chunk
        #[arg(long, value_parser = parse_chunk_size_arg)]
        chunk_size: Option<usize>,
        /// Accepted bearer token (repeatable); none accepts any bearer token
        #[arg(long = "token")]
        tokens: Vec<String>,
    },
    /// List the resources a library directory would serve
    Scan {
        /// Directory holding uploaded MP3 files
        library: Option<PathBuf>,
    },
}

fn parse_chunk_size_arg(value: &str) -> Result<usize, String> {
    parse_chunk_size(value).map_err(|e| e.to_string())
}

/// Handle the CLI command
///
/// Command-line flags take precedence over `TUNESTREAM_*` environment variables.
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let mut config =
        TuneStreamConfig::from_env().context("Failed to read TUNESTREAM_* environment")?;

    match command {
        Commands::Server {
            host,
            port,
            library,
            chunk_size,
            tokens,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(library) = library {
                config.storage.library_dir = library;
            }
            if let Some(chunk_size) = chunk_size {
                config.storage.chunk_size = chunk_size;
            }
            if !tokens.is_empty() {
                config.auth.tokens = tokens;
            }

            run_server(config).await.context("Server failed")
        }
        Commands::Scan { library } => {
            let library = library.unwrap_or(config.storage.library_dir);
            scan_library(library).await
        }
    }
}

/// Print one JSON line per resource found in the library.
///
/// # Errors
/// - Library directory cannot be read
/// - Resource cannot be serialized
pub async fn scan_library(library: PathBuf) -> anyhow::Result<()> {
    let catalog = LibraryCatalog::open(&library)
        .await
        .with_context(|| format!("Failed to scan {}", library.display()))?;

    let resources = catalog.list_resources().await;
    for resource in &resources {
        println!("{}", serde_json::to_string(resource)?);
    }

    tracing::info!(
        "Found {} resources in {}",
        resources.len(),
        library.display()
    );
    Ok(())
}
