//! 存储层模块
//!
//! 提供用户设置的持久化，支持 JSON 文件和内存两种实现。

pub mod settings_store;

pub use settings_store::{FileSettingsStore, MemorySettingsStore, SettingsStore};
