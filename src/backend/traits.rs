use async_trait::async_trait;

use super::types::{BackendError, ChatReply, ChatRequest, HealthStatus};

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(&self, request: ChatRequest) -> Result<ChatReply, BackendError>;

    async fn health(&self) -> Result<HealthStatus, BackendError>;
}
