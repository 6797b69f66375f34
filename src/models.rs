//! Data models for Google Drive API requests and responses.

use serde::{Deserialize, Serialize};

/// MIME type Drive uses to mark folder objects.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Metadata for a file or folder in Google Drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub parents: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,
}

impl FileMetadata {
    /// Whether this entry is a folder rather than a regular file.
    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) => s.parse::<u64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Response from the files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileMetadata>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Lightweight listing entry, carrying only the fields a child-reference
/// query asks for.
#[derive(Debug, Clone, Deserialize)]
pub struct ChildReference {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response from a child-reference listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildListResponse {
    #[serde(default)]
    pub files: Vec<ChildReference>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// OAuth2 token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }

    #[test]
    fn test_file_metadata_deserialize() {
        let json = r#"{
            "id": "abc123",
            "name": "photo.jpg",
            "mimeType": "image/jpeg",
            "parents": ["root"],
            "size": "1024"
        }"#;

        let metadata: FileMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.id, "abc123");
        assert_eq!(metadata.name, "photo.jpg");
        assert_eq!(metadata.mime_type, Some("image/jpeg".to_string()));
        assert_eq!(metadata.parents, Some(vec!["root".to_string()]));
        assert_eq!(metadata.size, Some(1024));
        assert!(!metadata.is_folder());
    }

    #[test]
    fn test_folder_metadata_deserialize() {
        let json = r#"{
            "id": "folder123",
            "name": "Photos",
            "mimeType": "application/vnd.google-apps.folder"
        }"#;

        let metadata: FileMetadata = serde_json::from_str(json).unwrap();
        assert!(metadata.is_folder());
        assert_eq!(metadata.size, None);
    }

    #[test]
    fn test_child_list_response_deserialize() {
        let json = r#"{
            "files": [{"id": "c1", "name": "sub"}, {"id": "c2"}],
            "nextPageToken": "token123"
        }"#;

        let response: ChildListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.files.len(), 2);
        assert_eq!(response.files[0].name, Some("sub".to_string()));
        assert_eq!(response.files[1].name, None);
        assert_eq!(response.next_page_token, Some("token123".to_string()));
    }

    #[test]
    fn test_token_response_without_refresh() {
        let json = r#"{"access_token": "ya29.x", "expires_in": 3599, "token_type": "Bearer"}"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "ya29.x");
        assert_eq!(response.refresh_token, None);
        assert_eq!(response.expires_in, Some(3599));
    }
}
