use crate::{
    config::Config,
    domain::PasswordHasher,
    errors::AppError,
    password::Argon2PasswordHasher,
    repositories::SqliteStore,
    AppState,
};
use std::sync::Arc;
use tracing;

/// Opens the configured database, applying the schema if it is missing.
pub fn open_store(config: &Config) -> Result<SqliteStore, AppError> {
    tracing::info!("Startup: Opening database '{}'...", config.database_path);
    let store = SqliteStore::open(&config.database_path).map_err(|e| {
        let context = format!("Startup: Failed to open database '{}'", config.database_path);
        tracing::error!("{}: {:?}", context, e);
        AppError::InitError(format!("{}: {}", context, e))
    })?;
    tracing::info!("Startup: Database ready.");
    Ok(store)
}

/// Wires one store into every state slot.
pub fn build_state(
    store: SqliteStore,
    hasher: Arc<dyn PasswordHasher>,
    config: Config,
) -> Arc<AppState> {
    let store = Arc::new(store);
    Arc::new(AppState {
        credentials: store.clone(),
        memes: store,
        hasher,
        config,
    })
}

/// Initializes everything the server needs. Template seeding is not part of it.
pub fn init_state(config: Config) -> Result<Arc<AppState>, AppError> {
    let store = open_store(&config)?;
    Ok(build_state(store, Arc::new(Argon2PasswordHasher::new()), config))
}
