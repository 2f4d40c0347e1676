//! MindPulse - 生命体征定时检查与共情聊天助手
//!
//! 定时读取心率和呼吸频率，按年龄段判定是否在正常范围内，
//! 再由对话模型生成关怀消息写入会话并推送通知。

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;
