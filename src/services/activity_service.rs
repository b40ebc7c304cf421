use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::Connection;

use crate::data::repository;
use crate::error::AppError;
use crate::models::activity::{FileActivity, FileDownload};

const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Stored timestamps share one format so they compare correctly as text.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn normalize_timestamp(raw: &str) -> Result<String, AppError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| format_timestamp(dt.with_timezone(&Utc)))
        .map_err(|e| AppError::Validation(format!("invalid timestamp {raw}: {e}")))
}

pub fn track(conn: &Connection, activity: &FileActivity) -> Result<FileActivity, AppError> {
    if activity.file_id.trim().is_empty() || activity.folder_id.trim().is_empty() {
        return Err(AppError::Validation(
            "activity requires file and folder ids".to_string(),
        ));
    }
    let normalized = FileActivity {
        created_at: normalize_timestamp(&activity.created_at)?,
        ..activity.clone()
    };
    repository::upsert_activity(conn, &normalized)
}

/// Downloads are logged on their own so they never show up as file changes.
pub fn record_download(
    conn: &Connection,
    folder_id: &str,
    folder_name: &str,
    file_id: &str,
    file_name: &str,
    at: DateTime<Utc>,
) -> Result<FileDownload, AppError> {
    let download = FileDownload {
        folder_id: folder_id.to_string(),
        folder_name: folder_name.to_string(),
        file_id: file_id.to_string(),
        file_name: file_name.to_string(),
        downloaded_at: format_timestamp(at),
    };
    repository::insert_download(conn, &download)?;
    Ok(download)
}

/// Activities newer than the user's last look at the notification panel.
pub fn unread_notifications(
    conn: &Connection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<FileActivity>, AppError> {
    let since = match repository::get_last_viewed(conn, user_id)? {
        Some(viewed) => viewed,
        None => format_timestamp(now - Duration::days(DEFAULT_LOOKBACK_DAYS)),
    };
    repository::activities_since(conn, &since)
}

pub fn mark_viewed(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<(), AppError> {
    repository::set_last_viewed(conn, user_id, &format_timestamp(now))
}
