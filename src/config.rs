use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::AppError;
use crate::services::folder_session::DEFAULT_FETCH_TIMEOUT;

const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_LOGIN_URL: &str = "https://login.microsoftonline.com";

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub graph_url: String,
    pub login_url: String,
    pub db_path: PathBuf,
    pub fetch_timeout: Duration,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup("PORTAL_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };
        let timeout_secs: u64 = try_load(
            &lookup,
            "PORTAL_FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(AppError::Validation(
                "PORTAL_FETCH_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            tenant_id: required(&lookup, "PORTAL_TENANT_ID")?,
            client_id: required(&lookup, "PORTAL_CLIENT_ID")?,
            client_secret: required(&lookup, "PORTAL_CLIENT_SECRET")?,
            graph_url: try_load(&lookup, "PORTAL_GRAPH_URL", DEFAULT_GRAPH_URL.to_string())?,
            login_url: try_load(&lookup, "PORTAL_LOGIN_URL", DEFAULT_LOGIN_URL.to_string())?,
            db_path,
            fetch_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            warn!("{key} is not set");
            AppError::Validation(format!("{key} is required"))
        })
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AppError::Validation(format!("invalid {key}: {e}"))
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn default_db_path() -> Result<PathBuf, AppError> {
    directories::ProjectDirs::from("com", "DrivePortal", "drive-portal")
        .map(|dirs| dirs.data_dir().join("portal.db"))
        .ok_or_else(|| AppError::General("could not resolve data directory".to_string()))
}
