use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::chat_dto::*},
    error::AppError,
};

pub async fn list_messages(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let response = TranscriptResponse::from(state.chat.transcript());
    debug!("Listing {} messages", response.total);
    Ok(Json(response))
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Sending chat message ({} chars)", request.content.len());

    let reply = state.chat.send_message(&request.content).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}
