use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::AppError;
use crate::services::folder_session::{FolderSession, ListingFetcher};
use crate::services::graph_service::RemoteDrive;

pub struct AppState {
    pub db: Mutex<rusqlite::Connection>,
    pub db_path: PathBuf,
    pub drive: Arc<dyn RemoteDrive>,
    pub fetch_timeout: Duration,
    listings: Arc<dyn ListingFetcher>,
    sessions: Mutex<HashMap<String, Arc<FolderSession>>>,
}

impl AppState {
    pub fn new<D>(
        conn: rusqlite::Connection,
        db_path: PathBuf,
        drive: Arc<D>,
        fetch_timeout: Duration,
    ) -> Self
    where
        D: RemoteDrive + 'static,
    {
        let listings: Arc<dyn ListingFetcher> = drive.clone();
        Self {
            db: Mutex::new(conn),
            db_path,
            drive,
            fetch_timeout,
            listings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn connection(&self) -> Result<MutexGuard<'_, rusqlite::Connection>, AppError> {
        self.db.lock().map_err(|e| AppError::General(e.to_string()))
    }

    /// A navigation session that is not reachable by id until it is registered.
    pub fn new_session(&self) -> Arc<FolderSession> {
        Arc::new(FolderSession::new(
            self.listings.clone(),
            self.fetch_timeout,
        ))
    }

    /// Makes `session` reachable under `session_id`, replacing any previous one.
    pub fn register_session(&self, session_id: &str, session: Arc<FolderSession>) {
        let mut sessions = self.lock_sessions();
        if sessions.insert(session_id.to_string(), session).is_some() {
            tracing::info!(session_id, "replaced existing folder session");
        }
    }

    pub fn session(&self, session_id: &str) -> Result<Arc<FolderSession>, AppError> {
        self.lock_sessions()
            .get(session_id)
            .cloned()
            .ok_or_else(|| {
                AppError::PreconditionViolation(format!("no open session {session_id}"))
            })
    }

    pub fn close_session(&self, session_id: &str) -> bool {
        let removed = self.lock_sessions().remove(session_id).is_some();
        if removed {
            tracing::info!(session_id, "folder session closed");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.lock_sessions().len()
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<String, Arc<FolderSession>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state, FakeDrive};

    fn open(state: &AppState, session_id: &str) -> Arc<FolderSession> {
        let session = state.new_session();
        state.register_session(session_id, session.clone());
        session
    }

    #[test]
    fn sessions_are_keyed_by_id() {
        let state = test_state(FakeDrive::default());
        let a = open(&state, "a");
        let b = open(&state, "b");

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &state.session("a").unwrap()));
        assert_eq!(state.session_count(), 2);
    }

    #[test]
    fn reopening_replaces_the_session() {
        let state = test_state(FakeDrive::default());
        let first = open(&state, "a");
        let second = open(&state, "a");

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &state.session("a").unwrap()));
        assert_eq!(state.session_count(), 1);
    }

    #[test]
    fn closed_sessions_are_gone() {
        let state = test_state(FakeDrive::default());
        open(&state, "a");

        assert!(state.close_session("a"));
        assert!(!state.close_session("a"));
        assert!(matches!(
            state.session("a"),
            Err(AppError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn unregistered_sessions_are_not_reachable() {
        let state = test_state(FakeDrive::default());
        let _pending = state.new_session();

        assert_eq!(state.session_count(), 0);
        assert!(state.session("a").is_err());
    }
}
