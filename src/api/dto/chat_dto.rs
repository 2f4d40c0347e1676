//! 聊天 DTO

use serde::{Deserialize, Serialize};

use crate::models::message::ChatMessage;

/// 发送消息请求
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// 消息内容
    pub content: String,
}

/// 会话记录响应
#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub messages: Vec<ChatMessage>,
    pub total: usize,
}

impl From<Vec<ChatMessage>> for TranscriptResponse {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self {
            total: messages.len(),
            messages,
        }
    }
}
