//! Chat completion 传输层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::config::ChatConfig;
use crate::error::Result;

/// 请求中的单条消息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion 请求体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub max_tokens: u32,
}

/// 网络层失败（连接、超时、读取响应体）
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// 发送请求并返回原始响应体；非 2xx 状态码同样返回响应体，由调用方解析
    async fn post(&self, request: &ChatCompletionRequest) -> std::result::Result<String, TransportError>;
}

/// 基于 reqwest 的 HTTP 传输
pub struct HttpChatTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpChatTransport {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        Self::new(
            &config.endpoint,
            &config.api_key,
            Duration::from_secs(config.timeout_seconds),
        )
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn post(&self, request: &ChatCompletionRequest) -> std::result::Result<String, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        debug!(status = %status, bytes = body.len(), "chat completion response received");

        Ok(body)
    }
}
