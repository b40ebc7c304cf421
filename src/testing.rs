//! In-memory provider and state used by the command tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::data::migrations::run_migrations;
use crate::error::FetchError;
use crate::models::navigation::BreadcrumbEntry;
use crate::models::remote_item::RemoteItem;
use crate::services::folder_session::{ListingFetcher, DEFAULT_FETCH_TIMEOUT};
use crate::services::graph_service::{DownloadedFile, RemoteDrive};
use crate::state::AppState;

#[derive(Default)]
pub struct FakeDrive {
    pub shares: HashMap<String, BreadcrumbEntry>,
    pub listings: HashMap<String, Vec<RemoteItem>>,
    pub contents: HashMap<String, Vec<u8>>,
    pub downloads: Mutex<Vec<String>>,
}

impl FakeDrive {
    pub fn with_share(mut self, share_id: &str, root: BreadcrumbEntry) -> Self {
        self.shares.insert(share_id.to_string(), root);
        self
    }

    pub fn with_listing(mut self, folder_id: &str, items: Vec<RemoteItem>) -> Self {
        self.listings.insert(folder_id.to_string(), items);
        self
    }

    pub fn with_content(mut self, item_id: &str, bytes: &[u8]) -> Self {
        self.contents.insert(item_id.to_string(), bytes.to_vec());
        self
    }
}

#[async_trait]
impl ListingFetcher for FakeDrive {
    async fn fetch_folder_listing(
        &self,
        folder: &BreadcrumbEntry,
    ) -> Result<Vec<RemoteItem>, FetchError> {
        self.listings
            .get(&folder.id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(folder.id.clone()))
    }
}

#[async_trait]
impl RemoteDrive for FakeDrive {
    async fn resolve_share(&self, share_id: &str) -> Result<BreadcrumbEntry, FetchError> {
        self.shares
            .get(share_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(share_id.to_string()))
    }

    async fn download(
        &self,
        _drive_id: &str,
        item_id: &str,
        file_name: &str,
    ) -> Result<DownloadedFile, FetchError> {
        self.downloads.lock().unwrap().push(item_id.to_string());
        let bytes = self
            .contents
            .get(item_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(item_id.to_string()))?;
        Ok(DownloadedFile::new(file_name, None, None, bytes))
    }
}

pub fn test_state(drive: FakeDrive) -> AppState {
    test_state_with(Arc::new(drive))
}

pub fn test_state_with(drive: Arc<FakeDrive>) -> AppState {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    AppState::new(conn, PathBuf::new(), drive, DEFAULT_FETCH_TIMEOUT)
}
