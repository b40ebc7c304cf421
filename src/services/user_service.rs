use rusqlite::Connection;

use crate::data::repository;
use crate::error::AppError;
use crate::models::user::User;

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    });
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!("invalid email address: {email}")));
    }
    Ok(email)
}

fn normalize_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<User>, AppError> {
    repository::get_user_by_email(conn, &normalize_email(email)?)
}

pub fn user_exists(conn: &Connection, email: &str) -> Result<bool, AppError> {
    match normalize_email(email) {
        Ok(email) => repository::user_exists(conn, &email),
        Err(_) => Ok(false),
    }
}

pub fn require_user(conn: &Connection, email: &str) -> Result<User, AppError> {
    find_by_email(conn, email)?.ok_or_else(|| AppError::NotFound(format!("user {email}")))
}

pub fn require_admin(conn: &Connection, email: &str) -> Result<User, AppError> {
    let user = find_by_email(conn, email)?
        .ok_or_else(|| AppError::PermissionDenied(format!("{email} is not a portal user")))?;
    if !user.is_admin {
        return Err(AppError::PermissionDenied(format!(
            "{email} is not an administrator"
        )));
    }
    Ok(user)
}

pub fn add_user(
    conn: &Connection,
    name: &str,
    email: &str,
    is_admin: bool,
) -> Result<User, AppError> {
    let name = normalize_name(name)?;
    let email = normalize_email(email)?;
    if repository::user_exists(conn, &email)? {
        return Err(AppError::Validation(format!("user {email} already exists")));
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        email,
        folder_id: None,
        is_admin,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    repository::insert_user(conn, &user)?;
    tracing::info!(user_id = %user.id, email = %user.email, "user added");
    Ok(user)
}

pub fn remove_user(conn: &Connection, user_id: &str) -> Result<(), AppError> {
    if repository::delete_user(conn, user_id)? == 0 {
        return Err(AppError::NotFound(format!("user {user_id}")));
    }
    tracing::info!(user_id, "user removed");
    Ok(())
}

/// An empty folder id clears the assignment.
pub fn assign_folder(conn: &Connection, user_id: &str, folder_id: &str) -> Result<User, AppError> {
    let folder_id = Some(folder_id.trim()).filter(|f| !f.is_empty());
    if repository::update_user_folder(conn, user_id, folder_id)? == 0 {
        return Err(AppError::NotFound(format!("user {user_id}")));
    }
    tracing::info!(user_id, folder_id = folder_id.unwrap_or("<none>"), "folder assigned");
    repository::get_user_by_id(conn, user_id)?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
}

pub fn set_admin(conn: &Connection, user_id: &str, is_admin: bool) -> Result<User, AppError> {
    if repository::set_user_admin(conn, user_id, is_admin)? == 0 {
        return Err(AppError::NotFound(format!("user {user_id}")));
    }
    tracing::info!(user_id, is_admin, "admin flag changed");
    repository::get_user_by_id(conn, user_id)?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
}

/// The share id granted to a user, which the provider resolves to their root folder.
pub fn assigned_share_id(conn: &Connection, email: &str) -> Result<String, AppError> {
    let user = require_user(conn, email)?;
    user.folder_id.ok_or_else(|| {
        AppError::PreconditionViolation(format!("no folder assigned to {}", user.email))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::migrations::run_migrations;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn add_user_normalizes_input() {
        let conn = setup_db();
        let user = add_user(&conn, "  Dana Smith ", " Dana@Example.COM ", false).unwrap();

        assert_eq!(user.name, "Dana Smith");
        assert_eq!(user.email, "dana@example.com");
        assert!(user.folder_id.is_none());
        assert!(user_exists(&conn, "dana@example.com").unwrap());
    }

    #[test]
    fn add_user_rejects_bad_input_and_duplicates() {
        let conn = setup_db();
        assert!(matches!(
            add_user(&conn, "", "a@example.com", false),
            Err(AppError::Validation(_))
        ));
        for email in ["nobody", "@example.com", "a@localhost", "a b@example.com"] {
            assert!(
                matches!(add_user(&conn, "A", email, false), Err(AppError::Validation(_))),
                "{email} accepted"
            );
        }

        add_user(&conn, "Dana", "dana@example.com", false).unwrap();
        assert!(matches!(
            add_user(&conn, "Dana again", "DANA@example.com", false),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn admin_check() {
        let conn = setup_db();
        add_user(&conn, "Admin", "admin@example.com", true).unwrap();
        add_user(&conn, "Client", "client@example.com", false).unwrap();

        assert!(require_admin(&conn, "admin@example.com").is_ok());
        assert!(matches!(
            require_admin(&conn, "client@example.com"),
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            require_admin(&conn, "stranger@example.com"),
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[test]
    fn assign_and_clear_folder() {
        let conn = setup_db();
        let user = add_user(&conn, "Dana", "dana@example.com", false).unwrap();

        assert!(matches!(
            assigned_share_id(&conn, "dana@example.com"),
            Err(AppError::PreconditionViolation(_))
        ));

        let updated = assign_folder(&conn, &user.id, " share-123 ").unwrap();
        assert_eq!(updated.folder_id.as_deref(), Some("share-123"));
        assert_eq!(assigned_share_id(&conn, "dana@example.com").unwrap(), "share-123");

        let cleared = assign_folder(&conn, &user.id, "").unwrap();
        assert!(cleared.folder_id.is_none());
    }

    #[test]
    fn unknown_users_are_not_found() {
        let conn = setup_db();
        assert!(matches!(remove_user(&conn, "missing"), Err(AppError::NotFound(_))));
        assert!(matches!(
            assign_folder(&conn, "missing", "share"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            assigned_share_id(&conn, "ghost@example.com"),
            Err(AppError::NotFound(_))
        ));
        assert!(!user_exists(&conn, "not an email").unwrap());
    }
}
