use serde::{Deserialize, Serialize};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    Folder { child_count: Option<u64> },
    File { mime_type: Option<String> },
}

/// One entry of a remote folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub size: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub web_url: Option<String>,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
}

impl RemoteItem {
    pub fn folder(id: &str, name: &str) -> Self {
        Self::bare(id, name, ItemKind::Folder { child_count: None })
    }

    pub fn file(id: &str, name: &str, mime_type: Option<&str>) -> Self {
        Self::bare(
            id,
            name,
            ItemKind::File {
                mime_type: mime_type.map(str::to_string),
            },
        )
    }

    fn bare(id: &str, name: &str, kind: ItemKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            size: None,
            thumbnail_url: None,
            web_url: None,
            created_at: None,
            modified_at: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ItemKind::Folder { .. })
    }

    pub fn mime_type(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::File { mime_type } => mime_type.as_deref(),
            ItemKind::Folder { .. } => None,
        }
    }

    /// Images are detected from the MIME hint first, then from the file extension.
    pub fn is_image(&self) -> bool {
        if self.is_folder() {
            return false;
        }
        if self.mime_type().is_some_and(|m| m.starts_with("image/")) {
            return true;
        }
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Folders first, then case-insensitive name.
pub fn sort_for_display(items: &mut [RemoteItem]) {
    items.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_detection_uses_mime_then_extension() {
        assert!(RemoteItem::file("1", "scan", Some("image/png")).is_image());
        assert!(RemoteItem::file("2", "Site.JPG", None).is_image());
        assert!(!RemoteItem::file("3", "a.pdf", Some("application/pdf")).is_image());
        assert!(!RemoteItem::folder("4", "photos.png").is_image());
    }

    #[test]
    fn display_order_puts_folders_first() {
        let mut items = vec![
            RemoteItem::file("1", "b.pdf", None),
            RemoteItem::folder("2", "Zoning"),
            RemoteItem::file("3", "A.pdf", None),
            RemoteItem::folder("4", "budget"),
        ];
        sort_for_display(&mut items);

        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["budget", "Zoning", "A.pdf", "b.pdf"]);
    }
}
