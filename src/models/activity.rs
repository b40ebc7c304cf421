use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Added,
    Modified,
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(Self::Added),
            "modified" => Ok(Self::Modified),
            _ => Err(format!("unknown activity type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileActivity {
    pub folder_id: String,
    pub folder_name: String,
    pub file_id: String,
    pub file_name: String,
    pub activity_type: ActivityType,
    /// RFC 3339, UTC.
    pub created_at: String,
}

/// A file served through the portal. Kept apart from the change feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDownload {
    pub folder_id: String,
    pub folder_name: String,
    pub file_id: String,
    pub file_name: String,
    pub downloaded_at: String,
}
