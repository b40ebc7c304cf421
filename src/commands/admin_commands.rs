use crate::data::repository;
use crate::error::AppError;
use crate::models::user::User;
use crate::services::user_service;
use crate::state::AppState;

pub fn list_users(state: &AppState, actor_email: &str) -> Result<Vec<User>, AppError> {
    let conn = state.connection()?;
    user_service::require_admin(&conn, actor_email)?;
    repository::list_users(&conn)
}

pub fn add_user(
    state: &AppState,
    actor_email: &str,
    name: &str,
    email: &str,
) -> Result<User, AppError> {
    let conn = state.connection()?;
    user_service::require_admin(&conn, actor_email)?;
    user_service::add_user(&conn, name, email, false)
}

pub fn remove_user(state: &AppState, actor_email: &str, user_id: &str) -> Result<(), AppError> {
    let conn = state.connection()?;
    let actor = user_service::require_admin(&conn, actor_email)?;
    if actor.id == user_id {
        return Err(AppError::Validation(
            "administrators cannot remove themselves".to_string(),
        ));
    }
    user_service::remove_user(&conn, user_id)
}

pub fn assign_folder(
    state: &AppState,
    actor_email: &str,
    user_id: &str,
    folder_id: &str,
) -> Result<User, AppError> {
    let conn = state.connection()?;
    user_service::require_admin(&conn, actor_email)?;
    user_service::assign_folder(&conn, user_id, folder_id)
}

pub fn set_admin(
    state: &AppState,
    actor_email: &str,
    user_id: &str,
    is_admin: bool,
) -> Result<User, AppError> {
    let conn = state.connection()?;
    let actor = user_service::require_admin(&conn, actor_email)?;
    if actor.id == user_id && !is_admin {
        return Err(AppError::Validation(
            "administrators cannot revoke their own access".to_string(),
        ));
    }
    user_service::set_admin(&conn, user_id, is_admin)
}

/// Sign-in gate: only registered users get a session.
pub fn user_exists(state: &AppState, email: &str) -> Result<bool, AppError> {
    let conn = state.connection()?;
    user_service::user_exists(&conn, email)
}

pub fn find_user_by_email(state: &AppState, email: &str) -> Result<Option<User>, AppError> {
    let conn = state.connection()?;
    user_service::find_by_email(&conn, email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state, FakeDrive};

    const ADMIN: &str = "admin@example.com";

    fn state_with_admin() -> AppState {
        let state = test_state(FakeDrive::default());
        {
            let conn = state.connection().unwrap();
            user_service::add_user(&conn, "Admin", ADMIN, true).unwrap();
        }
        state
    }

    #[test]
    fn admin_manages_users() {
        let state = state_with_admin();

        let client = add_user(&state, ADMIN, "Zed Client", "zed@example.com").unwrap();
        add_user(&state, ADMIN, "amy client", "amy@example.com").unwrap();
        assert!(!client.is_admin);

        let names: Vec<String> = list_users(&state, ADMIN)
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["Admin", "amy client", "Zed Client"]);

        let client = assign_folder(&state, ADMIN, &client.id, "share-9").unwrap();
        assert_eq!(client.folder_id.as_deref(), Some("share-9"));

        assert!(set_admin(&state, ADMIN, &client.id, true).unwrap().is_admin);

        remove_user(&state, ADMIN, &client.id).unwrap();
        assert!(!user_exists(&state, "zed@example.com").unwrap());
        assert!(find_user_by_email(&state, "amy@example.com").unwrap().is_some());
    }

    #[test]
    fn non_admins_are_denied() {
        let state = state_with_admin();
        let client = add_user(&state, ADMIN, "Client", "client@example.com").unwrap();

        assert!(matches!(
            list_users(&state, "client@example.com"),
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            add_user(&state, "client@example.com", "Eve", "eve@example.com"),
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            assign_folder(&state, "nobody@example.com", &client.id, "share"),
            Err(AppError::PermissionDenied(_))
        ));
        assert!(!user_exists(&state, "eve@example.com").unwrap());
    }

    #[test]
    fn admins_cannot_lock_themselves_out() {
        let state = state_with_admin();
        let admin = find_user_by_email(&state, ADMIN).unwrap().unwrap();

        assert!(matches!(
            remove_user(&state, ADMIN, &admin.id),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            set_admin(&state, ADMIN, &admin.id, false),
            Err(AppError::Validation(_))
        ));
    }
}
