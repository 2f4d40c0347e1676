use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 消息发送方
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// 用户消息
    User,
    /// 助手消息
    Assistant,
}

impl Sender {
    /// Chat completion 接口使用的角色名
    pub fn role(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

/// 对话消息
///
/// 创建后不可变；会话顺序即追加顺序。`id` 只用于界面定位。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// 消息唯一标识
    pub id: Uuid,
    /// 消息内容
    pub content: String,
    /// 发送方
    pub sender: Sender,
    /// 创建时间
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// 创建新消息
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, content)
    }
}
