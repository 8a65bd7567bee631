//! Wire DTOs for the Graph drive API.

use chrono::{DateTime, Utc};
use connector_traits::SourceEntry;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ChildrenPage {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub file: Option<FileFacet>,
    pub folder: Option<FolderFacet>,
    pub last_modified_date_time: Option<DateTime<Utc>>,
    pub list_item: Option<ListItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileFacet {
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FolderFacet {}

#[derive(Debug, Deserialize)]
pub(crate) struct ListItem {
    pub fields: Option<ListItemFields>,
}

/// System columns carried on the drive item's backing list entry.
#[derive(Debug, Deserialize)]
pub(crate) struct ListItemFields {
    /// Site-managed opt-in column; absent on sources that do not
    /// curate ingestion per item.
    #[serde(rename = "Include")]
    pub include: Option<bool>,
}

impl DriveItem {
    pub fn into_entry(self) -> SourceEntry {
        let has_system_fields = self
            .list_item
            .as_ref()
            .is_some_and(|li| li.fields.is_some());
        let include_flag = self
            .list_item
            .as_ref()
            .and_then(|li| li.fields.as_ref())
            .and_then(|f| f.include);
        SourceEntry {
            is_container: self.folder.is_some(),
            mime_type: self.file.and_then(|f| f.mime_type),
            id: self.id,
            name: self.name,
            size_bytes: self.size,
            last_modified_at: self.last_modified_date_time,
            include_flag,
            has_system_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_item_maps_to_leaf_entry() {
        let raw = r#"{
            "id": "item-1",
            "name": "report.pdf",
            "size": 2048,
            "file": {"mimeType": "application/pdf"},
            "lastModifiedDateTime": "2026-02-01T10:00:00Z",
            "listItem": {"fields": {"Include": true}}
        }"#;
        let item: DriveItem = serde_json::from_str(raw).unwrap();
        let entry = item.into_entry();
        assert!(!entry.is_container);
        assert_eq!(entry.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(entry.include_flag, Some(true));
        assert!(entry.has_system_fields);
    }

    #[test]
    fn folder_item_maps_to_container_entry() {
        let raw = r#"{"id": "dir-1", "name": "docs", "folder": {}}"#;
        let item: DriveItem = serde_json::from_str(raw).unwrap();
        let entry = item.into_entry();
        assert!(entry.is_container);
        assert!(entry.mime_type.is_none());
        assert!(!entry.has_system_fields);
    }

    #[test]
    fn page_parses_continuation_link() {
        let raw = r#"{
            "value": [{"id": "i", "name": "n", "folder": {}}],
            "@odata.nextLink": "https://graph.example.com/next?$skiptoken=abc"
        }"#;
        let page: ChildrenPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.value.len(), 1);
        assert!(page.next_link.unwrap().contains("skiptoken"));
    }
}
