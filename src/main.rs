use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formdrop::config::Config;
use formdrop::db::Database;
use formdrop::storage::LocalBlobStore;
use formdrop::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formdrop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting formdrop...");

    let config = Config::load()?;
    let config = Arc::new(config);
    tracing::info!("Configuration loaded");

    // A missing or unreachable database is a warning, not a startup
    // failure: submissions still save files, records are skipped.
    let db = match &config.database.path {
        Some(path) => match Database::new(path).await {
            Ok(db) => {
                db.run_migrations().await?;
                tracing::info!("Database initialized at {}", path);
                Some(db)
            }
            Err(e) => {
                tracing::warn!("Cannot open database, running without it: {}", e);
                None
            }
        },
        None => {
            tracing::warn!("No database configured, running without persistence");
            None
        }
    };

    let storage = Arc::new(LocalBlobStore::new(&config.storage.upload_path));

    let state = AppState {
        db,
        config: config.clone(),
        storage,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
