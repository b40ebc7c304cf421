//! Microsoft Graph drive client.
//!
//! Uses an app-only token obtained through the client-credentials grant; the
//! token is cached until shortly before it expires.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::PortalConfig;
use crate::error::{AppError, FetchError};
use crate::models::navigation::BreadcrumbEntry;
use crate::models::remote_item::{ItemKind, RemoteItem};
use crate::services::folder_session::ListingFetcher;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
const CHILDREN_SELECT: &str = "id,name,size,folder,file,webUrl,createdDateTime,lastModifiedDateTime";
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Provider operations beyond listing that the portal relies on.
#[async_trait]
pub trait RemoteDrive: ListingFetcher {
    /// Resolves a shared folder id to the folder's drive, item id and name.
    async fn resolve_share(&self, share_id: &str) -> Result<BreadcrumbEntry, FetchError>;

    async fn download(
        &self,
        drive_id: &str,
        item_id: &str,
        file_name: &str,
    ) -> Result<DownloadedFile, FetchError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadedFile {
    pub file_name: String,
    pub content_type: String,
    pub content_disposition: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl DownloadedFile {
    pub fn new(
        file_name: &str,
        content_type: Option<String>,
        content_disposition: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        let content_type = content_type.unwrap_or_else(|| {
            mime_guess::from_path(file_name)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string()
        });
        let content_disposition = content_disposition
            .unwrap_or_else(|| format!("attachment; filename=\"{}\"", file_name.replace('"', "")));
        Self {
            file_name: file_name.to_string(),
            content_type,
            content_disposition,
            bytes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveItemDto {
    id: String,
    name: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    folder: Option<FolderFacet>,
    #[serde(default)]
    file: Option<FileFacet>,
    #[serde(default)]
    web_url: Option<String>,
    #[serde(default)]
    created_date_time: Option<String>,
    #[serde(default)]
    last_modified_date_time: Option<String>,
    #[serde(default)]
    thumbnails: Vec<ThumbnailSet>,
    #[serde(default)]
    parent_reference: Option<ParentReference>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderFacet {
    #[serde(default)]
    child_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileFacet {
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailSet {
    #[serde(default)]
    large: Option<Thumbnail>,
    #[serde(default)]
    medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParentReference {
    #[serde(default)]
    drive_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChildrenPage {
    value: Vec<DriveItemDto>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

impl From<DriveItemDto> for RemoteItem {
    fn from(dto: DriveItemDto) -> Self {
        let kind = match (dto.folder, dto.file) {
            (Some(folder), _) => ItemKind::Folder {
                child_count: folder.child_count,
            },
            (None, file) => ItemKind::File {
                mime_type: file.and_then(|f| f.mime_type),
            },
        };
        let thumbnail_url = dto
            .thumbnails
            .into_iter()
            .find_map(|set| set.large.or(set.medium))
            .map(|t| t.url);

        RemoteItem {
            id: dto.id,
            name: dto.name,
            kind,
            size: dto.size,
            thumbnail_url,
            web_url: dto.web_url,
            created_at: dto.created_date_time,
            modified_at: dto.last_modified_date_time,
        }
    }
}

pub struct GraphClient {
    http: reqwest::Client,
    graph_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl GraphClient {
    pub fn new(config: &PortalConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;
        Ok(Self {
            http,
            graph_url: config.graph_url.trim_end_matches('/').to_string(),
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                config.login_url.trim_end_matches('/'),
                config.tenant_id
            ),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, FetchError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.value.clone());
        }

        tracing::debug!("requesting app access token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: TokenResponse = response.json().await?;

        let token = CachedToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        };
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?;
        let result = check_status(response).await;
        if matches!(result, Err(FetchError::Unauthorized)) {
            self.forget_token(&token).await;
        }
        result
    }

    /// Drops a token the provider rejected so the next request fetches a new one.
    async fn forget_token(&self, rejected: &str) {
        let mut cached = self.token.lock().await;
        if cached.as_ref().is_some_and(|t| t.value == rejected) {
            tracing::warn!("cached access token rejected, discarding it");
            *cached = None;
        }
    }

    pub async fn list_children(
        &self,
        drive_id: &str,
        item_id: &str,
    ) -> Result<Vec<RemoteItem>, FetchError> {
        let first = reqwest::Url::parse_with_params(
            &format!("{}/drives/{drive_id}/items/{item_id}/children", self.graph_url),
            &[
                ("$select", CHILDREN_SELECT),
                ("$expand", "thumbnails"),
                ("$orderby", "name"),
            ],
        )
        .map_err(|e| FetchError::Network(format!("invalid listing url: {e}")))?;

        let mut items = Vec::new();
        let mut next = Some(first.to_string());
        while let Some(url) = next {
            let page: ChildrenPage = self.get(&url).await?.json().await?;
            items.extend(page.value.into_iter().map(RemoteItem::from));
            next = page.next_link;
        }

        tracing::debug!(drive_id, item_id, count = items.len(), "listed folder children");
        Ok(items)
    }
}

#[async_trait]
impl ListingFetcher for GraphClient {
    async fn fetch_folder_listing(
        &self,
        folder: &BreadcrumbEntry,
    ) -> Result<Vec<RemoteItem>, FetchError> {
        self.list_children(&folder.drive_id, &folder.id).await
    }
}

#[async_trait]
impl RemoteDrive for GraphClient {
    async fn resolve_share(&self, share_id: &str) -> Result<BreadcrumbEntry, FetchError> {
        let url = format!("{}/shares/{share_id}/driveItem", self.graph_url);
        let item: DriveItemDto = self.get(&url).await?.json().await?;
        share_root(item)
    }

    async fn download(
        &self,
        drive_id: &str,
        item_id: &str,
        file_name: &str,
    ) -> Result<DownloadedFile, FetchError> {
        let url = format!("{}/drives/{drive_id}/items/{item_id}/content", self.graph_url);
        let response = self.get(&url).await?;

        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let content_disposition = header(CONTENT_DISPOSITION);
        let bytes = response.bytes().await?.to_vec();

        tracing::info!(item_id, size = bytes.len(), "downloaded file content");
        Ok(DownloadedFile::new(
            file_name,
            content_type,
            content_disposition,
            bytes,
        ))
    }
}

fn share_root(item: DriveItemDto) -> Result<BreadcrumbEntry, FetchError> {
    let drive_id = item
        .parent_reference
        .and_then(|p| p.drive_id)
        .ok_or_else(|| FetchError::NotFound(format!("drive of shared item {}", item.id)))?;
    Ok(BreadcrumbEntry {
        id: item.id,
        name: item.name,
        drive_id,
    })
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FetchError::from_status(status.as_u16(), &body))
}
