use serde::{Deserialize, Serialize};

/// A document found by the backend, stored in Google Drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub filename: String,
    pub gdrive_url: String,
    pub gdrive_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}
