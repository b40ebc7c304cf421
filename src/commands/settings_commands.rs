use std::time::Duration;

use crate::data::repository;
use crate::error::AppError;
use crate::services::user_service;
use crate::state::AppState;

pub const FETCH_TIMEOUT_SETTING: &str = "fetch_timeout_secs";

pub fn get_setting(state: &AppState, key: &str) -> Result<Option<String>, AppError> {
    let conn = state.connection()?;
    repository::get_setting(&conn, key)
}

/// Admin-only. Known keys are validated before they are stored.
pub fn set_setting(
    state: &AppState,
    actor_email: &str,
    key: &str,
    value: &str,
) -> Result<(), AppError> {
    let conn = state.connection()?;
    user_service::require_admin(&conn, actor_email)?;
    if key == FETCH_TIMEOUT_SETTING {
        parse_timeout(value)?;
    }
    repository::set_setting(&conn, key, value.trim())?;
    tracing::info!(key, "setting updated");
    Ok(())
}

pub fn parse_timeout(raw: &str) -> Result<Duration, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::Validation(format!(
            "{FETCH_TIMEOUT_SETTING} must be a positive number of seconds, got {raw:?}"
        ))),
    }
}
