//! Chat Routes

use crate::api::handlers::chat_handler::*;
use axum::{Router, routing::get};

use crate::api::app_state::AppState;

/// 创建聊天路由器
pub fn create_chat_router() -> Router<AppState> {
    Router::new().route("/messages", get(list_messages).post(send_message))
}
