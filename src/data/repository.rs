use rusqlite::{params, Connection, Row};

use crate::error::AppError;
use crate::models::activity::{ActivityType, FileActivity, FileDownload};
use crate::models::user::User;

const USER_COLUMNS: &str = "id, name, email, folder_id, is_admin, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        folder_id: row.get(3)?,
        is_admin: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<FileActivity> {
    let type_str: String = row.get(4)?;
    Ok(FileActivity {
        folder_id: row.get(0)?,
        folder_name: row.get(1)?,
        file_id: row.get(2)?,
        file_name: row.get(3)?,
        activity_type: type_str.parse().unwrap_or(ActivityType::Modified),
        created_at: row.get(5)?,
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO users (id, name, email, folder_id, is_admin, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id,
            user.name,
            user.email,
            user.folder_id,
            user.is_admin,
            user.created_at,
        ],
    )?;
    Ok(())
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY name COLLATE NOCASE ASC"
    ))?;
    let users = stmt
        .query_map([], user_from_row)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(users)
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, AppError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>, AppError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn user_exists(conn: &Connection, email: &str) -> Result<bool, AppError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        params![email],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn delete_user(conn: &Connection, id: &str) -> Result<usize, AppError> {
    let count = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(count)
}

pub fn update_user_folder(
    conn: &Connection,
    id: &str,
    folder_id: Option<&str>,
) -> Result<usize, AppError> {
    let count = conn.execute(
        "UPDATE users SET folder_id = ?2 WHERE id = ?1",
        params![id, folder_id],
    )?;
    Ok(count)
}

pub fn set_user_admin(conn: &Connection, id: &str, is_admin: bool) -> Result<usize, AppError> {
    let count = conn.execute(
        "UPDATE users SET is_admin = ?2 WHERE id = ?1",
        params![id, is_admin],
    )?;
    Ok(count)
}

/// Any newer event for a known file is stored as `modified`; older events are ignored.
pub fn upsert_activity(conn: &Connection, activity: &FileActivity) -> Result<FileActivity, AppError> {
    conn.execute(
        "INSERT INTO file_activities (folder_id, folder_name, file_id, file_name, activity_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(file_id) DO UPDATE SET
            folder_id = CASE WHEN excluded.created_at > file_activities.created_at
                THEN excluded.folder_id ELSE file_activities.folder_id END,
            folder_name = CASE WHEN excluded.created_at > file_activities.created_at
                THEN excluded.folder_name ELSE file_activities.folder_name END,
            file_name = CASE WHEN excluded.created_at > file_activities.created_at
                THEN excluded.file_name ELSE file_activities.file_name END,
            activity_type = CASE
                WHEN excluded.created_at <= file_activities.created_at THEN file_activities.activity_type
                ELSE 'modified' END,
            created_at = MAX(excluded.created_at, file_activities.created_at)",
        params![
            activity.folder_id,
            activity.folder_name,
            activity.file_id,
            activity.file_name,
            activity.activity_type.to_string(),
            activity.created_at,
        ],
    )?;

    let stored = conn.query_row(
        "SELECT folder_id, folder_name, file_id, file_name, activity_type, created_at
         FROM file_activities WHERE file_id = ?1",
        params![activity.file_id],
        activity_from_row,
    )?;
    Ok(stored)
}

pub fn activities_since(conn: &Connection, since: &str) -> Result<Vec<FileActivity>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT folder_id, folder_name, file_id, file_name, activity_type, created_at
         FROM file_activities WHERE created_at > ?1 ORDER BY created_at DESC",
    )?;
    let activities = stmt
        .query_map(params![since], activity_from_row)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(activities)
}

pub fn insert_download(conn: &Connection, download: &FileDownload) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO file_downloads (folder_id, folder_name, file_id, file_name, downloaded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            download.folder_id,
            download.folder_name,
            download.file_id,
            download.file_name,
            download.downloaded_at,
        ],
    )?;
    Ok(())
}

pub fn downloads_for_file(conn: &Connection, file_id: &str) -> Result<Vec<FileDownload>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT folder_id, folder_name, file_id, file_name, downloaded_at
         FROM file_downloads WHERE file_id = ?1 ORDER BY downloaded_at DESC, id DESC",
    )?;
    let downloads = stmt
        .query_map(params![file_id], |row| {
            Ok(FileDownload {
                folder_id: row.get(0)?,
                folder_name: row.get(1)?,
                file_id: row.get(2)?,
                file_name: row.get(3)?,
                downloaded_at: row.get(4)?,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();
    Ok(downloads)
}

pub fn get_last_viewed(conn: &Connection, user_id: &str) -> Result<Option<String>, AppError> {
    let viewed = conn
        .query_row(
            "SELECT last_viewed_at FROM user_notifications WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(viewed)
}

pub fn set_last_viewed(conn: &Connection, user_id: &str, at: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO user_notifications (user_id, last_viewed_at) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET last_viewed_at = excluded.last_viewed_at",
        params![user_id, at],
    )?;
    Ok(())
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>, AppError> {
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

// Needed for rusqlite optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
