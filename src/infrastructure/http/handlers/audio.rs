//! Audio Handlers

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;

use crate::application::GetAudioQuery;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 返回会话当前持有的音频
pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let result = state
        .get_audio_handler
        .handle(GetAudioQuery { session_id })
        .await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type())
        .header(header::CONTENT_LENGTH, result.audio_data().len())
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(result.audio_data().to_vec()))
        .map_err(|e| ApiError::Internal(format!("Failed to build audio response: {}", e)))
}
