pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
#[cfg(test)]
mod testing;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use commands::settings_commands::{parse_timeout, FETCH_TIMEOUT_SETTING};
use config::PortalConfig;
use data::{migrations, repository};
use error::AppError;
use services::graph_service::GraphClient;
use state::AppState;

/// Installs the global subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,drive_portal=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn init_db(db_path: &Path) -> Result<rusqlite::Connection, AppError> {
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = rusqlite::Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// A stored timeout setting takes precedence over the configured one.
fn effective_timeout(conn: &rusqlite::Connection, configured: Duration) -> Duration {
    match repository::get_setting(conn, FETCH_TIMEOUT_SETTING) {
        Ok(Some(raw)) => match parse_timeout(&raw) {
            Ok(timeout) => timeout,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring stored fetch timeout");
                configured
            }
        },
        Ok(None) => configured,
        Err(e) => {
            tracing::warn!(error = %e, "could not read fetch timeout setting");
            configured
        }
    }
}

pub fn bootstrap(config: PortalConfig) -> Result<AppState, AppError> {
    let conn = init_db(&config.db_path)?;
    let fetch_timeout = effective_timeout(&conn, config.fetch_timeout);
    let drive = Arc::new(GraphClient::new(&config)?);
    tracing::info!(
        db_path = %config.db_path.display(),
        fetch_timeout_secs = fetch_timeout.as_secs(),
        "drive portal ready"
    );
    Ok(AppState::new(conn, config.db_path, drive, fetch_timeout))
}
