//! 对话服务
//!
//! 组装系统消息和历史对话，调用 chat completion 接口，遇到限流按固定间隔重试。

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clients::chat_transport::{ChatCompletionRequest, ChatTransport, WireMessage};
use crate::config::config::ChatConfig;
use crate::models::message::ChatMessage;
use crate::observability::AppMetrics;
use crate::services::prompt::build_system_prompt;

/// 限流错误码
pub const RATE_LIMIT_CODE: &str = "rate_limit_exceeded";

/// 对话失败类型，均为本次调用的终态
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversationError {
    /// 缺少年龄、心率或呼吸频率，未发起请求
    #[error("missing health data or age")]
    MissingData,

    /// 网络或连接失败
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// 重试耗尽后仍被限流
    #[error("rate limit exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// 响应体格式不符合预期
    #[error("unparsable response: {0}")]
    UnparsableResponse(String),
}

impl ConversationError {
    /// 作为聊天内容展示给用户的文本
    pub fn user_message(&self) -> &'static str {
        match self {
            ConversationError::MissingData => "Error: Missing health data or age.",
            ConversationError::TransportFailure(_) => "Error: Could not connect to AI service.",
            ConversationError::RateLimited { .. } => {
                "Error: Rate limit exceeded. Please try again later."
            }
            ConversationError::UnparsableResponse(_) => "Error: Could not interpret AI response.",
        }
    }
}

/// 重试之间的等待，测试中可替换为记录型实现
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 限流重试策略：第 n 次重试前等待 base + step × n
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(120),
            step: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        self.base_delay + self.step * retry_index
    }
}

#[derive(Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
}

enum Attempt {
    Content(String),
    RateLimited,
}

fn interpret(body: &str) -> Result<Attempt, ConversationError> {
    let parsed: CompletionBody = serde_json::from_str(body)
        .map_err(|e| ConversationError::UnparsableResponse(e.to_string()))?;

    if let Some(content) = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
    {
        return Ok(Attempt::Content(content.trim().to_string()));
    }

    match parsed.error.and_then(|error| error.code) {
        Some(code) if code == RATE_LIMIT_CODE => Ok(Attempt::RateLimited),
        Some(code) => Err(ConversationError::UnparsableResponse(format!(
            "api error code {}",
            code
        ))),
        None => Err(ConversationError::UnparsableResponse(
            "no choices in response".to_string(),
        )),
    }
}

/// 对话客户端
pub struct ConversationClient {
    transport: Arc<dyn ChatTransport>,
    delay: Arc<dyn Delay>,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
    metrics: Arc<AppMetrics>,
}

impl ConversationClient {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        model: &str,
        max_tokens: u32,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            transport,
            delay: Arc::new(TokioDelay),
            model: model.to_string(),
            max_tokens,
            retry: RetryPolicy::default(),
            metrics,
        }
    }

    pub fn from_config(
        transport: Arc<dyn ChatTransport>,
        config: &ChatConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self::new(transport, &config.model, config.max_tokens, metrics)
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 组装请求：系统消息在前，历史消息按原顺序追加
    pub fn build_request(
        &self,
        history: &[ChatMessage],
        age: i32,
        heart_rate: f64,
        respiratory_rate: f64,
    ) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(WireMessage::new(
            "system",
            build_system_prompt(age, heart_rate, respiratory_rate),
        ));
        messages.extend(
            history
                .iter()
                .map(|message| WireMessage::new(message.sender.role(), message.content.clone())),
        );

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
        }
    }

    /// 根据历史对话和最新读数生成助手回复
    pub async fn respond(
        &self,
        history: &[ChatMessage],
        age: Option<i32>,
        heart_rate: Option<f64>,
        respiratory_rate: Option<f64>,
    ) -> Result<String, ConversationError> {
        let (Some(age), Some(heart_rate), Some(respiratory_rate)) =
            (age, heart_rate, respiratory_rate)
        else {
            debug!("skipping model call, reading or age unavailable");
            return Err(ConversationError::MissingData);
        };

        let request = self.build_request(history, age, heart_rate, respiratory_rate);
        let result = self.send_with_retry(&request).await;
        if result.is_err() {
            self.metrics.record_error();
        }
        result
    }

    async fn send_with_retry(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<String, ConversationError> {
        let mut retry_index = 0;
        loop {
            self.metrics.record_model_request();
            let body = self.transport.post(request).await.map_err(|e| {
                warn!(error = %e, "chat completion request failed");
                ConversationError::TransportFailure(e.to_string())
            })?;

            match interpret(&body) {
                Ok(Attempt::Content(content)) => {
                    info!(
                        attempts = retry_index + 1,
                        chars = content.len(),
                        "assistant reply received"
                    );
                    return Ok(content);
                }
                Ok(Attempt::RateLimited) if retry_index < self.retry.max_retries => {
                    let delay = self.retry.delay_for(retry_index);
                    warn!(
                        retry = retry_index + 1,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, retrying"
                    );
                    self.delay.sleep(delay).await;
                    retry_index += 1;
                }
                Ok(Attempt::RateLimited) => {
                    warn!(attempts = retry_index + 1, "rate limit retries exhausted");
                    return Err(ConversationError::RateLimited {
                        attempts: retry_index + 1,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "could not interpret chat completion response");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::clients::chat_transport::TransportError;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// 按顺序返回预设响应的传输层
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String, TransportError>>>,
        pub requests: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl ScriptedTransport {
        pub fn new(responses: Vec<Result<String, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn reply(content: &str) -> Result<String, TransportError> {
            Ok(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })
            .to_string())
        }

        pub fn rate_limited() -> Result<String, TransportError> {
            Ok(r#"{"error":{"code":"rate_limit_exceeded","message":"slow down"}}"#.to_string())
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn post(&self, request: &ChatCompletionRequest) -> Result<String, TransportError> {
            self.requests.lock().push(request.clone());
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError("script exhausted".to_string())))
        }
    }

    /// 只记录等待时长的 Delay
    #[derive(Default)]
    pub struct RecordingDelay {
        pub waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().push(duration);
        }
    }
}
