//! 推送通知出口

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// 通知标题
pub const NOTIFICATION_TITLE: &str = "Health Update from AI";

/// 一条用户可见的通知
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// 通知出口 trait
///
/// 发送即忘：实现内部记录失败，不向调用方返回错误。
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, title: &str, body: &str);
}

/// 以结构化日志形式输出通知
#[derive(Debug, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, title: &str, body: &str) {
        info!(title, body, "notification");
    }
}

/// 广播给进程内的订阅者
#[derive(Debug, Clone)]
pub struct BroadcastNotificationSink {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotificationSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl NotificationSink for BroadcastNotificationSink {
    async fn notify(&self, title: &str, body: &str) {
        let notification = Notification {
            title: title.to_string(),
            body: body.to_string(),
        };
        if self.tx.send(notification).is_err() {
            debug!("no notification subscribers, dropping");
        }
    }
}
