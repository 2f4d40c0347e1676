//! Settings Routes

use crate::api::handlers::settings_handler::*;
use axum::{
    Router,
    routing::{get, put},
};

use crate::api::app_state::AppState;

/// 创建设置路由器
pub fn create_settings_router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings/birthday", put(set_birthday))
        .route("/settings/fetch-interval", put(set_fetch_interval))
        .route(
            "/settings/notify-on-normal-range",
            put(set_notify_on_normal_range),
        )
}
