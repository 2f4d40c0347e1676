//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod chat_handler;
pub mod pulse_handler;
pub mod settings_handler;
