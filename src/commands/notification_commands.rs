use chrono::Utc;

use crate::error::AppError;
use crate::models::activity::FileActivity;
use crate::services::{activity_service, user_service};
use crate::state::AppState;

pub fn track_activity(state: &AppState, activity: FileActivity) -> Result<FileActivity, AppError> {
    let conn = state.connection()?;
    activity_service::track(&conn, &activity)
}

pub fn unread_notifications(state: &AppState, email: &str) -> Result<Vec<FileActivity>, AppError> {
    let conn = state.connection()?;
    let user = user_service::require_user(&conn, email)?;
    activity_service::unread_notifications(&conn, &user.id, Utc::now())
}

pub fn mark_notifications_viewed(state: &AppState, email: &str) -> Result<(), AppError> {
    let conn = state.connection()?;
    let user = user_service::require_user(&conn, email)?;
    activity_service::mark_viewed(&conn, &user.id, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::ActivityType;
    use crate::testing::{test_state, FakeDrive};

    fn upload(file_id: &str, at: chrono::DateTime<Utc>) -> FileActivity {
        FileActivity {
            folder_id: "f1".to_string(),
            folder_name: "Drawings".to_string(),
            file_id: file_id.to_string(),
            file_name: format!("{file_id}.pdf"),
            activity_type: ActivityType::Added,
            created_at: activity_service::format_timestamp(at),
        }
    }

    #[test]
    fn viewing_clears_unread() {
        let state = test_state(FakeDrive::default());
        {
            let conn = state.connection().unwrap();
            user_service::add_user(&conn, "Dana", "dana@example.com", false).unwrap();
        }
        let an_hour_ago = Utc::now() - chrono::Duration::hours(1);
        track_activity(&state, upload("d1", an_hour_ago)).unwrap();

        let unread = unread_notifications(&state, "dana@example.com").unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].activity_type, ActivityType::Added);

        mark_notifications_viewed(&state, "dana@example.com").unwrap();
        assert!(unread_notifications(&state, "dana@example.com")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn re_upload_becomes_modified() {
        let state = test_state(FakeDrive::default());
        let earlier = Utc::now() - chrono::Duration::days(2);
        track_activity(&state, upload("d1", earlier)).unwrap();

        let stored =
            track_activity(&state, upload("d1", earlier + chrono::Duration::days(1))).unwrap();
        assert_eq!(stored.activity_type, ActivityType::Modified);
    }

    #[test]
    fn unknown_user_has_no_notifications() {
        let state = test_state(FakeDrive::default());
        assert!(matches!(
            unread_notifications(&state, "ghost@example.com"),
            Err(AppError::NotFound(_))
        ));
    }
}
