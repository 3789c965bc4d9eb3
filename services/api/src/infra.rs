use leadflow::clients::SqliteClientStore;
use leadflow::config::{AppConfig, ConfigError, DatabaseConfig};
use leadflow::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Load configuration, replacing the database path when one was passed on the command line.
pub(crate) fn load_config(db_path: Option<String>) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = db_path {
        config.database = DatabaseConfig::new(path)?;
    }
    Ok(config)
}

/// Open the database and bring its schema up to date. Any failure here is fatal.
pub(crate) fn prepare_store(
    config: &DatabaseConfig,
) -> Result<(SqliteClientStore, Vec<&'static str>), AppError> {
    let store = SqliteClientStore::open(&config.path)?;
    store.init_schema()?;
    let applied = store.apply_pending_migrations()?;
    info!(path = %config.path, applied = applied.len(), "database ready");
    Ok((store, applied))
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow::clients::StoreError;

    #[test]
    fn prepare_store_migrates_fresh_database_once() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("leads.db");
        let config = DatabaseConfig::new(path.to_string_lossy()).expect("valid path");

        let (_, applied) = prepare_store(&config).expect("fresh database");
        assert!(!applied.is_empty());

        let (_, applied) = prepare_store(&config).expect("existing database");
        assert!(applied.is_empty());
    }

    #[test]
    fn prepare_store_fails_when_a_migration_cannot_apply() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("leads.db");
        rusqlite::Connection::open(&path)
            .expect("raw connection")
            .execute_batch("CREATE TABLE clients (id INTEGER);")
            .expect("conflicting table created");
        let config = DatabaseConfig::new(path.to_string_lossy()).expect("valid path");

        let err = prepare_store(&config).err().expect("startup must fail");
        assert!(
            matches!(err, AppError::Store(StoreError::Migration { .. })),
            "unexpected error: {err}"
        );
    }
}
