//! `tallerd` — the repair-shop workflow server binary.
//!
//! Usage:
//!   tallerd -c <name-or-path> [--listen <addr>]
//!
//! The config name resolves to `/etc/taller/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod auth_middleware;
mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use taller_core::{Module, UserDirectory};

use config::ServerConfig;

/// Taller server.
#[derive(Parser, Debug)]
#[command(name = "tallerd", about = "Repair-shop workflow server")]
struct Cli {
    /// Config name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = taller_core::ServiceConfig {
        data_dir: Some(data_dir.clone()),
        listen: cli.listen.clone(),
        ..Default::default()
    };

    let sql: Arc<dyn taller_sql::SQLStore> = Arc::new(
        taller_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    let blobs: Arc<dyn taller_blob::BlobStore> = Arc::new(
        taller_blob::FileStore::open(&core_config.resolve_blob_dir())
            .map_err(|e| anyhow::anyhow!("failed to open blob store: {}", e))?,
    );

    // ── Modules ──

    let auth_config = auth::service::AuthConfig {
        jwt_secret: server_config.jwt.secret.clone(),
        token_ttl: server_config.jwt.expire_secs,
    };
    let auth_module = auth::AuthModule::new(Arc::clone(&sql), auth_config)?;
    info!("Auth module initialized");

    // First-start seeding: the access-code record must exist before
    // anyone can register.
    bootstrap::ensure_access_codes(auth_module.service(), &server_config)?;

    let directory: Arc<dyn UserDirectory> = auth_module.service().clone();
    let orders_module = orders::OrdersModule::new(Arc::clone(&sql), directory, blobs)?;
    info!("Orders module initialized");

    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (orders_module.name(), orders_module.routes()),
    ];

    let app = routes::build_router(Arc::clone(auth_module.service()), module_routes);

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Taller server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
