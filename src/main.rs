use anyhow::Context;
use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;

use taskserver::core::config::{AppConfig, StoreBackend};
use taskserver::core::shared::utils::{create_conn, run_migrations};
use taskserver::main_module::run_axum_server;
use taskserver::security::PasswordHasher;
use taskserver::shared::state::AppState;
use taskserver::storage::{MemoryStore, PgStore, TaskStore, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env: {e}");
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    info!(
        "Starting {} {} with {:?} store",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.store
    );

    let (users, tasks): (Arc<dyn UserStore>, Arc<dyn TaskStore>) = match config.store {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .clone()
                .context("DATABASE_URL must be set for the postgres store")?;
            let pool = create_conn(&database_url).context("Failed to create database pool")?;
            let migration_pool = pool.clone();
            tokio::task::spawn_blocking(move || run_migrations(&migration_pool))
                .await?
                .map_err(|e| anyhow::anyhow!("Migration failed: {e}"))?;
            let store = Arc::new(PgStore::new(pool));
            let users: Arc<dyn UserStore> = store.clone();
            let tasks: Arc<dyn TaskStore> = store;
            (users, tasks)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let users: Arc<dyn UserStore> = store.clone();
            let tasks: Arc<dyn TaskStore> = store;
            (users, tasks)
        }
    };

    let password_hasher = PasswordHasher::with_defaults()?;
    let state = Arc::new(AppState::new(config, users, tasks, password_hasher)?);

    if let Err(e) = run_axum_server(state).await {
        error!("Server error: {e}");
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}
