//! 会话记录

use parking_lot::RwLock;

use crate::models::message::ChatMessage;

/// 按追加顺序保存的对话消息
#[derive(Debug, Default)]
pub struct Transcript {
    messages: RwLock<Vec<ChatMessage>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, message: ChatMessage) -> ChatMessage {
        self.messages.write().push(message.clone());
        message
    }

    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.read().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    pub fn last(&self) -> Option<ChatMessage> {
        self.messages.read().last().cloned()
    }
}
