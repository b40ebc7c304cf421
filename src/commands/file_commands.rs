use crate::error::{AppError, FetchError};
use crate::services::activity_service;
use crate::services::graph_service::DownloadedFile;
use crate::state::AppState;

/// Downloads a file from the session's current listing. Items outside the
/// folder the user is looking at are never served.
pub async fn download_file(
    state: &AppState,
    session_id: &str,
    item_id: &str,
) -> Result<DownloadedFile, AppError> {
    let session = state.session(session_id)?;
    let item = session
        .find_item(item_id)
        .ok_or_else(|| AppError::NotFound(format!("item {item_id} in current folder")))?;
    if item.is_folder() {
        return Err(AppError::Validation(format!(
            "{} is a folder and cannot be downloaded",
            item.name
        )));
    }
    let folder = session.current_folder().ok_or_else(|| {
        AppError::PreconditionViolation("download called before initialize".to_string())
    })?;

    let file = state
        .drive
        .download(&folder.drive_id, &item.id, &item.name)
        .await
        .map_err(|e| download_error(&item.id, e).log())?;

    {
        let conn = state.connection()?;
        activity_service::record_download(
            &conn,
            &folder.id,
            &folder.name,
            &item.id,
            &item.name,
            chrono::Utc::now(),
        )?;
    }
    tracing::info!(session_id, item_id, size = file.bytes.len(), "file downloaded");
    Ok(file)
}

fn download_error(item_id: &str, err: FetchError) -> AppError {
    match err {
        FetchError::Unauthorized => AppError::AuthenticationExpired,
        FetchError::NotFound(_) | FetchError::Forbidden(_) => {
            AppError::NotFound(format!("item {item_id}"))
        }
        other => AppError::General(format!("download of {item_id} failed: {other}")),
    }
}
