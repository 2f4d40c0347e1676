//! 外部协作方客户端
//!
//! 健康数据源、对话模型接口和推送通知。

pub mod biometrics;
pub mod chat_transport;
pub mod notification;

pub use biometrics::{BiometricSource, FileBiometricSource, StaticBiometricSource};
pub use chat_transport::{ChatCompletionRequest, ChatTransport, HttpChatTransport, WireMessage};
pub use notification::{
    BroadcastNotificationSink, LogNotificationSink, Notification, NotificationSink,
    NOTIFICATION_TITLE,
};
