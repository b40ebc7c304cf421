use std::time::Duration;

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication expired")]
    AuthenticationExpired,

    #[error("listing unavailable for folder {folder_id}: {cause}")]
    ListingUnavailable { folder_id: String, cause: String },

    #[error("listing for folder {folder_id} timed out after {}s", .after.as_secs())]
    ListingTimedOut { folder_id: String, after: Duration },

    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0}")]
    General(String),
}

impl AppError {
    pub fn log(self) -> Self {
        tracing::error!(error = %self, "request failed");
        self
    }

    /// Maps a provider-level failure for `folder_id` into the navigation taxonomy.
    pub fn from_fetch(folder_id: &str, err: FetchError) -> Self {
        match err {
            FetchError::Unauthorized => AppError::AuthenticationExpired,
            other => AppError::ListingUnavailable {
                folder_id: folder_id.to_string(),
                cause: other.to_string(),
            },
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, AppError::AuthenticationExpired)
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Failure reported by the remote file-hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("provider rejected credentials")]
    Unauthorized,

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("item not found: {0}")]
    NotFound(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("provider error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unexpected provider response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => FetchError::Unauthorized,
            403 => FetchError::Forbidden(body.to_string()),
            404 => FetchError::NotFound(body.to_string()),
            _ => FetchError::Server {
                status,
                message: body.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return FetchError::Malformed(err.to_string());
        }
        match err.status() {
            Some(status) => FetchError::from_status(status.as_u16(), &err.to_string()),
            None => FetchError::Network(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_auth_expired() {
        let err = AppError::from_fetch("f1", FetchError::Unauthorized);
        assert!(err.is_auth_expired());
    }

    #[test]
    fn other_fetch_failures_keep_folder_id() {
        let err = AppError::from_fetch("f1", FetchError::Network("reset".to_string()));
        match err {
            AppError::ListingUnavailable { folder_id, cause } => {
                assert_eq!(folder_id, "f1");
                assert!(cause.contains("reset"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn revoked_access_is_not_an_auth_failure() {
        let err = AppError::from_fetch("f1", FetchError::from_status(403, "accessDenied"));
        assert!(!err.is_auth_expired());
        assert!(matches!(err, AppError::ListingUnavailable { .. }));
    }

    #[test]
    fn status_codes_map_to_fetch_errors() {
        assert_eq!(FetchError::from_status(401, ""), FetchError::Unauthorized);
        assert!(matches!(
            FetchError::from_status(403, "revoked"),
            FetchError::Forbidden(_)
        ));
        assert!(matches!(
            FetchError::from_status(404, "gone"),
            FetchError::NotFound(_)
        ));
        assert!(matches!(
            FetchError::from_status(503, "busy"),
            FetchError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn serializes_as_display_string() {
        let err = AppError::ListingTimedOut {
            folder_id: "f9".to_string(),
            after: Duration::from_secs(30),
        };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"listing for folder f9 timed out after 30s\"");
    }
}
