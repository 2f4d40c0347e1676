//! Pulse Routes
//!
//! 手动检查、外部唤醒和调度器控制。

use crate::api::handlers::pulse_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建健康检查路由器
pub fn create_pulse_router() -> Router<AppState> {
    Router::new()
        .route("/pulse/fetch", post(fetch_now))
        .route("/pulse/wake", post(wake))
        .route("/pulse/start", post(start_scheduler))
        .route("/pulse/stop", post(stop_scheduler))
        .route("/pulse/status", get(status))
}
