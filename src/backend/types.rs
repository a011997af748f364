use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::models::FileRef;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed with HTTP {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileRef>,
    #[serde(default)]
    pub folder_url: Option<String>,
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub ai_ready: bool,
    #[serde(default)]
    pub mode: Option<String>,
}

impl HealthStatus {
    pub fn is_ready(&self) -> bool {
        self.status == "online" && self.ai_ready
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FileRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<FileRef>>::deserialize(deserializer)?.unwrap_or_default())
}
