use axum::{Json, extract::State, response::IntoResponse};
use tracing::{debug, info};

use crate::{
    api::{app_state::AppState, dto::settings_dto::*},
    error::AppError,
};

pub async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let settings = state.settings.snapshot().await?;
    Ok(Json(
        SettingsResponse::from(&settings).with_scheduler(state.scheduler.state()),
    ))
}

pub async fn set_birthday(
    State(state): State<AppState>,
    Json(request): Json<SetBirthdayRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Setting birthday: {}", request.birthday);

    let settings = state.settings.set_birthday(request.birthday).await?;
    Ok(Json(SettingsResponse::from(&settings)))
}

/// 保存检查间隔并按新间隔重启调度器
pub async fn set_fetch_interval(
    State(state): State<AppState>,
    Json(request): Json<SetFetchIntervalRequest>,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.settings.set_fetch_interval(request.seconds).await?;
    let scheduler = state.scheduler.start(request.seconds);
    info!(seconds = request.seconds, ?scheduler, "fetch interval updated");

    Ok(Json(SettingsResponse::from(&settings).with_scheduler(scheduler)))
}

pub async fn set_notify_on_normal_range(
    State(state): State<AppState>,
    Json(request): Json<SetNotifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let settings = state
        .settings
        .set_notify_on_normal_range(request.enabled)
        .await?;
    Ok(Json(SettingsResponse::from(&settings)))
}
