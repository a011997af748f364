use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use url::Url;

use super::traits::ChatBackend;
use super::types::{BackendError, ChatReply, ChatRequest, HealthStatus};
use crate::config::ClientConfig;

/// Talks to the retrieval backend over plain HTTP + JSON.
pub struct HttpBackend {
    client: Client,
    chat_url: Url,
    health_url: Url,
    timeout: Option<Duration>,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::new(),
            chat_url: config.chat_endpoint(),
            health_url: config.health_endpoint(),
            timeout: config.request_timeout,
        }
    }

    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    fn with_timeout(&self, req: RequestBuilder) -> RequestBuilder {
        match self.timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }

    fn map_transport_error(&self, url: &Url, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Network(format!("Failed to reach {}: {}", url, e))
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_message(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
        let req = self.with_timeout(self.client.post(self.chat_url.clone()).json(&request));

        let response = req
            .send()
            .await
            .map_err(|e| self.map_transport_error(&self.chat_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Chat endpoint returned HTTP {}: {}", status.as_u16(), body);
            return Err(BackendError::Status(status.as_u16()));
        }

        response.json::<ChatReply>().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout
            } else {
                BackendError::InvalidResponse(format!("Failed to parse chat reply: {}", e))
            }
        })
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        let req = self.with_timeout(self.client.get(self.health_url.clone()));

        let response = req
            .send()
            .await
            .map_err(|e| self.map_transport_error(&self.health_url, e))?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }

        response.json::<HealthStatus>().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse health status: {}", e))
        })
    }
}
