use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, FetchError};
use crate::models::navigation::{BreadcrumbEntry, NavigationView};
use crate::models::remote_item::RemoteItem;
use crate::services::navigator::{FetchTicket, FolderNavigator, PreviewDirection, Settled};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote listing retrieval, implemented over the file-hosting provider.
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    async fn fetch_folder_listing(
        &self,
        folder: &BreadcrumbEntry,
    ) -> Result<Vec<RemoteItem>, FetchError>;
}

/// A navigator bound to a fetcher. The lock is only held while mutating state,
/// never across a fetch, so navigations may overlap.
pub struct FolderSession {
    navigator: Mutex<FolderNavigator>,
    fetcher: Arc<dyn ListingFetcher>,
    fetch_timeout: Duration,
}

impl FolderSession {
    pub fn new(fetcher: Arc<dyn ListingFetcher>, fetch_timeout: Duration) -> Self {
        Self {
            navigator: Mutex::new(FolderNavigator::new()),
            fetcher,
            fetch_timeout,
        }
    }

    pub async fn initialize(&self, root: BreadcrumbEntry) -> Result<NavigationView, AppError> {
        tracing::info!(root_id = %root.id, drive_id = %root.drive_id, "initializing folder session");
        let ticket = {
            let mut nav = self.lock();
            nav.begin_initialize(root)?
        };
        self.fetch_and_settle(ticket).await
    }

    pub async fn enter_folder(
        &self,
        folder_id: &str,
        name: &str,
    ) -> Result<NavigationView, AppError> {
        let ticket = {
            let mut nav = self.lock();
            nav.begin_enter(folder_id, name)?
        };
        self.fetch_and_settle(ticket).await
    }

    pub async fn go_back(&self) -> Result<NavigationView, AppError> {
        let ticket = {
            let mut nav = self.lock();
            nav.begin_back()?
        };
        match ticket {
            Some(ticket) => self.fetch_and_settle(ticket).await,
            None => Ok(self.view()),
        }
    }

    pub async fn open_root_folder(
        &self,
        folder_id: &str,
        name: &str,
    ) -> Result<NavigationView, AppError> {
        let ticket = {
            let mut nav = self.lock();
            nav.begin_open_root_folder(folder_id, name)?
        };
        self.fetch_and_settle(ticket).await
    }

    pub async fn refresh(&self) -> Result<NavigationView, AppError> {
        let ticket = {
            let mut nav = self.lock();
            nav.begin_refresh()?
        };
        self.fetch_and_settle(ticket).await
    }

    pub fn view(&self) -> NavigationView {
        self.lock().view()
    }

    pub fn root(&self) -> Option<BreadcrumbEntry> {
        self.lock().root().cloned()
    }

    pub fn current_folder(&self) -> Option<BreadcrumbEntry> {
        self.lock().breadcrumbs().last().cloned()
    }

    pub fn find_item(&self, item_id: &str) -> Option<RemoteItem> {
        self.lock()
            .listing()
            .iter()
            .find(|item| item.id == item_id)
            .cloned()
    }

    pub fn preview_images(&self) -> Vec<RemoteItem> {
        self.lock().preview_images()
    }

    pub fn adjacent_image(&self, item_id: &str, direction: PreviewDirection) -> Option<RemoteItem> {
        self.lock().adjacent_image(item_id, direction)
    }

    async fn fetch_and_settle(&self, ticket: FetchTicket) -> Result<NavigationView, AppError> {
        let result = self.fetch(ticket.folder()).await;

        let mut nav = self.lock();
        if nav.settle(ticket, result)? == Settled::Applied {
            tracing::debug!(
                folder_id = nav.current_folder_id().unwrap_or_default(),
                items = nav.listing().len(),
                "listing applied"
            );
        }
        Ok(nav.view())
    }

    async fn fetch(&self, folder: &BreadcrumbEntry) -> Result<Vec<RemoteItem>, AppError> {
        let request = self.fetcher.fetch_folder_listing(folder);
        match tokio::time::timeout(self.fetch_timeout, request).await {
            Ok(Ok(items)) => Ok(items),
            Ok(Err(err)) => {
                tracing::warn!(folder_id = %folder.id, error = %err, "listing fetch failed");
                Err(AppError::from_fetch(&folder.id, err))
            }
            Err(_) => {
                tracing::warn!(folder_id = %folder.id, "listing fetch timed out");
                Err(AppError::ListingTimedOut {
                    folder_id: folder.id.clone(),
                    after: self.fetch_timeout,
                })
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, FolderNavigator> {
        self.navigator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
