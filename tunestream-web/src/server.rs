//! Axum server for TuneStream
//!
//! Builds the router around a [`RangeStreamHandler`] and an [`Authorizer`],
//! and runs it until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tunestream_core::config::ConfigError;
use tunestream_core::{FileStore, LibraryCatalog, RangeStreamHandler, TuneStreamConfig};

use crate::auth::{AllowAllAuthorizer, Authorizer, StaticTokenAuthorizer};
use crate::handlers::{health, stream_resource};

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    /// Core range streaming handler
    pub stream_handler: Arc<RangeStreamHandler>,
    /// Credential check run before each stream request
    pub authorizer: Arc<dyn Authorizer>,
}

impl AppState {
    /// Create state from already-built collaborators
    pub fn new(stream_handler: RangeStreamHandler, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            stream_handler: Arc::new(stream_handler),
            authorizer,
        }
    }

    /// Build state for a library directory on disk.
    ///
    /// The directory is scanned once for `.mp3` files. With no configured
    /// tokens any bearer credential is accepted.
    ///
    /// # Errors
    /// - `ServerError::Library` - The library directory cannot be scanned
    pub async fn from_config(config: &TuneStreamConfig) -> Result<Self, ServerError> {
        let library_dir = config.storage.library_dir.clone();
        let catalog = LibraryCatalog::open(&library_dir)
            .await
            .map_err(|source| ServerError::Library {
                path: library_dir.clone(),
                source,
            })?;
        let store = FileStore::new(&library_dir);

        let handler =
            RangeStreamHandler::from_config(Arc::new(catalog), Arc::new(store), &config.storage);

        let authorizer: Arc<dyn Authorizer> = if config.auth.tokens.is_empty() {
            warn!("No bearer tokens configured; accepting any bearer credential");
            Arc::new(AllowAllAuthorizer)
        } else {
            Arc::new(StaticTokenAuthorizer::new(config.auth.tokens.iter().cloned()))
        };

        Ok(Self::new(handler, authorizer))
    }
}

/// Errors that stop the server from starting or running
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid listener configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The library directory could not be scanned
    #[error("Failed to scan library {path}: {source}")]
    Library {
        /// Library directory that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Binding or serving failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/resources/{id}/stream", get(stream_resource))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Scan the library, bind the configured address and serve until Ctrl-C.
///
/// # Errors
/// - `ServerError::Config` - The configured host is not an IP address
/// - `ServerError::Library` - The library directory cannot be scanned
/// - `ServerError::Io` - Binding or serving failed
pub async fn run_server(config: TuneStreamConfig) -> Result<(), ServerError> {
    let addr = config.server.socket_addr()?;
    let state = AppState::from_config(&config).await?;
    let resource_count = state.stream_handler.catalog().list_resources().await.len();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "TuneStream serving {} resources from {} on http://{}",
        resource_count,
        config.storage.library_dir.display(),
        listener.local_addr()?
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("TuneStream stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
