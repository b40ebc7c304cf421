use crate::error::AppError;
use crate::models::navigation::{BreadcrumbEntry, NavigationView};
use crate::models::remote_item::RemoteItem;
use crate::services::navigator::PreviewDirection;
use crate::services::user_service;
use crate::state::AppState;

/// Looks up the folder assigned to `email` and resolves it at the provider.
pub async fn resolve_root(state: &AppState, email: &str) -> Result<BreadcrumbEntry, AppError> {
    let share_id = {
        let conn = state.connection()?;
        user_service::assigned_share_id(&conn, email)?
    };
    state
        .drive
        .resolve_share(&share_id)
        .await
        .map_err(|e| AppError::from_fetch(&share_id, e))
}

pub async fn open_session(
    state: &AppState,
    session_id: &str,
    email: &str,
) -> Result<NavigationView, AppError> {
    let root = resolve_root(state, email).await.map_err(AppError::log)?;
    tracing::info!(session_id, email, root_id = %root.id, "opening folder session");
    let session = state.new_session();
    let view = session.initialize(root).await?;
    state.register_session(session_id, session);
    Ok(view)
}

pub async fn enter_folder(
    state: &AppState,
    session_id: &str,
    folder_id: &str,
    name: &str,
) -> Result<NavigationView, AppError> {
    state
        .session(session_id)?
        .enter_folder(folder_id, name)
        .await
}

pub async fn go_back(state: &AppState, session_id: &str) -> Result<NavigationView, AppError> {
    state.session(session_id)?.go_back().await
}

pub async fn open_root_folder(
    state: &AppState,
    session_id: &str,
    folder_id: &str,
    name: &str,
) -> Result<NavigationView, AppError> {
    state
        .session(session_id)?
        .open_root_folder(folder_id, name)
        .await
}

pub async fn refresh(state: &AppState, session_id: &str) -> Result<NavigationView, AppError> {
    state.session(session_id)?.refresh().await
}

pub fn current_view(state: &AppState, session_id: &str) -> Result<NavigationView, AppError> {
    Ok(state.session(session_id)?.view())
}

pub fn preview_images(state: &AppState, session_id: &str) -> Result<Vec<RemoteItem>, AppError> {
    Ok(state.session(session_id)?.preview_images())
}

pub fn adjacent_image(
    state: &AppState,
    session_id: &str,
    item_id: &str,
    direction: PreviewDirection,
) -> Result<Option<RemoteItem>, AppError> {
    Ok(state.session(session_id)?.adjacent_image(item_id, direction))
}

pub fn close_session(state: &AppState, session_id: &str) -> bool {
    state.close_session(session_id)
}
