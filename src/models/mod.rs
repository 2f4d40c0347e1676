//! 核心数据模型模块
//!
//! 定义 MindPulse 的核心数据结构：ChatMessage, BiometricSample, Settings。

pub mod biometric;
pub mod message;
pub mod settings;

pub use biometric::*;
pub use message::*;
pub use settings::*;
