// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! cadport Server - STEP to glTF conversion service.
//!
//! Uploaded STEP files are tessellated by an external mesher, written out as
//! OBJ, packaged as glTF and kept on disk under one directory per model.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `POST /api/convert` - Convert a STEP upload (multipart field `stepFile`)
//! - `GET /api/files` - List converted models
//! - `GET /api/files?fileName=<name>` - Download a model's glTF document

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use cadport_core::{
    ArtifactStore, Catalog, CommandParser, Converter, GeometryParser, GltfPackager,
    ObjGltfPackager,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod types;

use config::Config;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
    pub catalog: Arc<Catalog>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the pipeline with its collaborators.
    pub fn new(
        config: Config,
        store: ArtifactStore,
        parser: Arc<dyn GeometryParser>,
        packager: Arc<dyn GltfPackager>,
    ) -> Self {
        let catalog = Catalog::new(store.root(), config.public_url.clone());
        Self {
            converter: Arc::new(Converter::new(store, parser, packager)),
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }

    /// Production wiring: external mesher command and native glTF packager.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = ArtifactStore::open(&config.storage_dir)
            .with_context(|| format!("Failed to open storage directory {}", config.storage_dir))?;

        let parser = match &config.mesher_command {
            Some(command) => CommandParser::new(command),
            None => {
                tracing::warn!("STEP_MESHER_CMD is not set; conversions will fail at the parse stage");
                CommandParser::unconfigured()
            }
        };

        Ok(Self::new(
            config,
            store,
            Arc::new(parser),
            Arc::new(ObjGltfPackager::default()),
        ))
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Conversion and catalog
        .route("/api/convert", post(routes::convert::convert))
        .route("/api/files", get(routes::files::get_files))
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_body_size_bytes()))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "info,tower_http=debug,cadport_server=debug,cadport_core=debug".into()
    });
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    }

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        storage_dir = %config.storage_dir,
        public_url = %config.public_url,
        max_file_size_mb = config.max_file_size_mb,
        mesher = config.mesher_command.as_deref().unwrap_or("<none>"),
        "Starting cadport server"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::from_config(config)?;
    let app = app(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
