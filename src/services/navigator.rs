//! Folder navigation state for one signed-in session.
//!
//! Every navigation is split in two halves: a `begin_*` call that mutates the
//! path synchronously and hands out a [`FetchTicket`], and [`FolderNavigator::settle`]
//! which applies the fetched listing only when the ticket is still the latest one
//! issued. Between the two halves the caller is free to fetch asynchronously and to
//! start further navigations.

use crate::error::AppError;
use crate::models::navigation::{BreadcrumbEntry, ListingStatus, NavigationView};
use crate::models::remote_item::{sort_for_display, RemoteItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TicketKind {
    Root,
    Folder,
}

/// Tag carried by an outstanding listing fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    kind: TicketKind,
    folder: BreadcrumbEntry,
}

impl FetchTicket {
    pub fn folder(&self) -> &BreadcrumbEntry {
        &self.folder
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Applied,
    /// The user moved on before this fetch settled.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewDirection {
    Previous,
    Next,
}

#[derive(Debug, Default)]
pub struct FolderNavigator {
    current_folder_id: Option<String>,
    breadcrumbs: Vec<BreadcrumbEntry>,
    listing: Vec<RemoteItem>,
    root_folders: Vec<RemoteItem>,
    status: Option<ListingStatus>,
    generation: u64,
}

impl FolderNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.current_folder_id.is_some() && !self.breadcrumbs.is_empty()
    }

    pub fn current_folder_id(&self) -> Option<&str> {
        self.current_folder_id.as_deref()
    }

    pub fn breadcrumbs(&self) -> &[BreadcrumbEntry] {
        &self.breadcrumbs
    }

    pub fn listing(&self) -> &[RemoteItem] {
        &self.listing
    }

    pub fn root_folders(&self) -> &[RemoteItem] {
        &self.root_folders
    }

    pub fn root(&self) -> Option<&BreadcrumbEntry> {
        self.breadcrumbs.first()
    }

    pub fn at_root(&self) -> bool {
        self.breadcrumbs.len() <= 1
    }

    pub fn status(&self) -> ListingStatus {
        self.status.clone().unwrap_or(ListingStatus::Uninitialized)
    }

    pub fn begin_initialize(&mut self, root: BreadcrumbEntry) -> Result<FetchTicket, AppError> {
        if self.is_initialized() {
            return Err(AppError::PreconditionViolation(
                "navigator is already initialized".to_string(),
            ));
        }
        Ok(self.issue(TicketKind::Root, root))
    }

    pub fn begin_enter(&mut self, folder_id: &str, name: &str) -> Result<FetchTicket, AppError> {
        let drive_id = self.require_root("enter_folder")?.drive_id.clone();

        let already_open = self
            .breadcrumbs
            .last()
            .is_some_and(|last| last.id == folder_id);
        if !already_open {
            self.breadcrumbs
                .push(BreadcrumbEntry::new(folder_id, name, &drive_id));
        }

        let target = self.open_last();
        Ok(self.issue(TicketKind::Folder, target))
    }

    /// Returns `None` when already at the root; nothing is fetched in that case.
    pub fn begin_back(&mut self) -> Result<Option<FetchTicket>, AppError> {
        self.require_root("go_back")?;

        self.breadcrumbs.dedup_by(|a, b| a.id == b.id);
        if self.breadcrumbs.len() <= 1 {
            return Ok(None);
        }
        self.breadcrumbs.pop();

        let target = self.open_last();
        Ok(Some(self.issue(TicketKind::Folder, target)))
    }

    /// Jump from the side panel: the path collapses to the root plus the chosen folder.
    pub fn begin_open_root_folder(
        &mut self,
        folder_id: &str,
        name: &str,
    ) -> Result<FetchTicket, AppError> {
        let root = self.require_root("open_root_folder")?.clone();

        self.breadcrumbs.truncate(1);
        if root.id != folder_id {
            self.breadcrumbs
                .push(BreadcrumbEntry::new(folder_id, name, &root.drive_id));
        }

        let target = self.open_last();
        Ok(self.issue(TicketKind::Folder, target))
    }

    pub fn begin_refresh(&mut self) -> Result<FetchTicket, AppError> {
        self.require_root("refresh")?;
        let target = self.open_last();
        Ok(self.issue(TicketKind::Folder, target))
    }

    /// Applies a settled fetch. Results for superseded tickets leave the state
    /// untouched; their failures are still handed back to the caller.
    pub fn settle(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<RemoteItem>, AppError>,
    ) -> Result<Settled, AppError> {
        if !self.is_current(&ticket) {
            tracing::warn!(
                folder_id = %ticket.folder.id,
                generation = ticket.generation,
                latest = self.generation,
                "discarding stale listing"
            );
            return result.map(|_| Settled::Discarded);
        }

        match result {
            Ok(items) => {
                if ticket.kind == TicketKind::Root {
                    self.root_folders = items.iter().filter(|i| i.is_folder()).cloned().collect();
                    self.current_folder_id = Some(ticket.folder.id.clone());
                    self.breadcrumbs = vec![ticket.folder];
                }
                self.listing = items;
                self.status = Some(ListingStatus::Ready);
                Ok(Settled::Applied)
            }
            Err(err) => {
                self.listing.clear();
                self.status = Some(ListingStatus::Failed {
                    folder_id: ticket.folder.id,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    pub fn view(&self) -> NavigationView {
        NavigationView {
            current_folder_id: self.current_folder_id.clone(),
            breadcrumbs: self.breadcrumbs.clone(),
            items: self.display_listing(),
            root_folders: self.root_folders.clone(),
            status: self.status(),
            at_root: self.at_root(),
        }
    }

    pub fn display_listing(&self) -> Vec<RemoteItem> {
        let mut items = self.listing.clone();
        sort_for_display(&mut items);
        items
    }

    /// Image files of the current listing, in display order.
    pub fn preview_images(&self) -> Vec<RemoteItem> {
        self.display_listing()
            .into_iter()
            .filter(RemoteItem::is_image)
            .collect()
    }

    /// Steps through the preview gallery; clamps at both ends.
    pub fn adjacent_image(&self, item_id: &str, direction: PreviewDirection) -> Option<RemoteItem> {
        let images = self.preview_images();
        let index = images.iter().position(|i| i.id == item_id)?;
        let target = match direction {
            PreviewDirection::Previous => index.saturating_sub(1),
            PreviewDirection::Next => (index + 1).min(images.len() - 1),
        };
        images.into_iter().nth(target)
    }

    fn require_root(&self, operation: &str) -> Result<&BreadcrumbEntry, AppError> {
        match (&self.current_folder_id, self.breadcrumbs.first()) {
            (Some(_), Some(root)) => Ok(root),
            _ => Err(AppError::PreconditionViolation(format!(
                "{operation} called before initialize"
            ))),
        }
    }

    fn open_last(&mut self) -> BreadcrumbEntry {
        // require_root guarantees a non-empty path
        let last = self.breadcrumbs[self.breadcrumbs.len() - 1].clone();
        self.current_folder_id = Some(last.id.clone());
        last
    }

    fn issue(&mut self, kind: TicketKind, folder: BreadcrumbEntry) -> FetchTicket {
        self.generation += 1;
        self.status = Some(ListingStatus::Loading {
            folder_id: folder.id.clone(),
        });
        tracing::debug!(folder_id = %folder.id, generation = self.generation, "listing fetch issued");
        FetchTicket {
            generation: self.generation,
            kind,
            folder,
        }
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        match ticket.kind {
            TicketKind::Root => !self.is_initialized(),
            TicketKind::Folder => self.current_folder_id.as_deref() == Some(ticket.folder.id.as_str()),
        }
    }
}
