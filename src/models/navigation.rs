use serde::{Deserialize, Serialize};

use super::remote_item::RemoteItem;

/// One step of the navigation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbEntry {
    pub id: String,
    pub name: String,
    pub drive_id: String,
}

impl BreadcrumbEntry {
    pub fn new(id: &str, name: &str, drive_id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            drive_id: drive_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ListingStatus {
    Uninitialized,
    Loading { folder_id: String },
    Ready,
    Failed { folder_id: String, message: String },
}

/// Read-only snapshot handed to the UI layer.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationView {
    pub current_folder_id: Option<String>,
    pub breadcrumbs: Vec<BreadcrumbEntry>,
    pub items: Vec<RemoteItem>,
    pub root_folders: Vec<RemoteItem>,
    pub status: ListingStatus,
    pub at_root: bool,
}
