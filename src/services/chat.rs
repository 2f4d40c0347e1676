//! 用户聊天

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::message::ChatMessage;
use crate::services::conversation::ConversationClient;
use crate::services::pulse::PulsePipeline;
use crate::services::settings::SettingsManager;
use crate::services::transcript::Transcript;

pub struct ChatService {
    conversation: Arc<ConversationClient>,
    transcript: Arc<Transcript>,
    settings: Arc<SettingsManager>,
    pipeline: Arc<PulsePipeline>,
}

impl ChatService {
    pub fn new(
        conversation: Arc<ConversationClient>,
        transcript: Arc<Transcript>,
        settings: Arc<SettingsManager>,
        pipeline: Arc<PulsePipeline>,
    ) -> Self {
        Self {
            conversation,
            transcript,
            settings,
            pipeline,
        }
    }

    /// 发送用户消息，模型看到完整会话和最近一次读数
    ///
    /// 模型失败时把提示文本作为助手消息写入会话，调用方照常拿到一条助手消息。
    pub async fn send_message(&self, text: &str) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("消息内容不能为空".to_string()));
        }

        self.transcript.append(ChatMessage::user(text));
        let history = self.transcript.snapshot();
        let age = self.settings.snapshot().await?.age();
        let sample = self.pipeline.latest_sample();

        let content = match self
            .conversation
            .respond(
                &history,
                age,
                sample.map(|s| s.heart_rate),
                sample.map(|s| s.respiratory_rate),
            )
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "chat reply failed");
                e.user_message().to_string()
            }
        };

        let reply = self.transcript.append(ChatMessage::assistant(content));
        info!(messages = self.transcript.len(), "chat reply appended");
        Ok(reply)
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.snapshot()
    }
}
