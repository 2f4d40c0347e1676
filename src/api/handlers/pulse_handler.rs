use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use tracing::{debug, info};

use crate::{
    api::{app_state::AppState, dto::pulse_dto::*},
    error::AppError,
    models::settings::MAX_FETCH_INTERVAL_SECONDS,
    services::scheduler::{SchedulerState, next_wake_at},
};

/// 已保存的检查间隔，未设置时为默认值
async fn saved_interval(state: &AppState) -> Result<u64, AppError> {
    Ok(state.settings.snapshot().await?.preferences.fetch_interval())
}

/// 手动检查，结果写入会话并返回
pub async fn fetch_now(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    debug!("Manual health check requested");
    let message = state.scheduler.fetch_now().await;
    Ok(Json(message))
}

/// 宿主后台刷新唤醒，执行一轮定时检查
pub async fn wake(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    info!("External wake received");
    let outcome = state.scheduler.run_cycle().await;
    let interval = saved_interval(&state).await?;

    Ok(Json(WakeResponse {
        outcome,
        next_wake_at: next_wake_at(Utc::now(), interval),
    }))
}

pub async fn start_scheduler(
    State(state): State<AppState>,
    body: Option<Json<StartSchedulerRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let requested = body.and_then(|Json(request)| request.interval_seconds);
    let interval = match requested {
        Some(seconds) if seconds > MAX_FETCH_INTERVAL_SECONDS => {
            return Err(AppError::Validation(format!(
                "检查间隔不能超过 {} 秒",
                MAX_FETCH_INTERVAL_SECONDS
            )));
        }
        Some(seconds) => seconds,
        None => saved_interval(&state).await?,
    };
    debug!("Starting scheduler with interval {}s", interval);

    Ok(Json(state.scheduler.start(interval)))
}

pub async fn stop_scheduler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    debug!("Stopping scheduler");
    Ok(Json(state.scheduler.stop()))
}

pub async fn status(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let scheduler = state.scheduler.state();
    let interval = match scheduler {
        SchedulerState::Running { interval_seconds } => interval_seconds,
        SchedulerState::Idle => saved_interval(&state).await?,
    };

    Ok(Json(PulseStatusResponse {
        scheduler,
        latest_sample: state.scheduler.pipeline().latest_sample(),
        next_wake_at: next_wake_at(Utc::now(), interval),
    }))
}
