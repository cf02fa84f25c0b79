//! Session Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    CloseSessionCommand, CreateSessionCommand, GetSessionStatusQuery, GetSessionWordsQuery,
    PlaybackAction, PlaybackCommand, ReportPlaybackErrorCommand, SeekCommand, SessionWords,
};
use crate::infrastructure::http::dto::{
    ApiResponse, CloseSessionResponseDto, CreateSessionRequest, CreateSessionResponseDto,
    PlaybackStatusDto, ReportErrorRequest, SeekRequest, SessionRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

type StatusResult = Result<Json<ApiResponse<PlaybackStatusDto>>, ApiError>;

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<ApiResponse<CreateSessionResponseDto>>, ApiError> {
    let cmd = CreateSessionCommand {
        text: req.text,
        locale: req.locale,
    };

    let result = state.create_session_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(CreateSessionResponseDto {
        session_id: result.session_id,
        word_count: result.word_count,
    })))
}

async fn run_action(state: &AppState, session_id: String, action: PlaybackAction) -> StatusResult {
    let status = state
        .playback_handler
        .handle(PlaybackCommand { session_id, action })
        .await?;
    Ok(Json(ApiResponse::success(status)))
}

/// 开始播放；未缓存的文本会在此触发合成
pub async fn play(State(state): State<Arc<AppState>>, Json(req): Json<SessionRequest>) -> StatusResult {
    run_action(&state, req.session_id, PlaybackAction::Play).await
}

pub async fn pause(State(state): State<Arc<AppState>>, Json(req): Json<SessionRequest>) -> StatusResult {
    run_action(&state, req.session_id, PlaybackAction::Pause).await
}

pub async fn resume(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> StatusResult {
    run_action(&state, req.session_id, PlaybackAction::Resume).await
}

pub async fn stop(State(state): State<Arc<AppState>>, Json(req): Json<SessionRequest>) -> StatusResult {
    run_action(&state, req.session_id, PlaybackAction::Stop).await
}

pub async fn seek(State(state): State<Arc<AppState>>, Json(req): Json<SeekRequest>) -> StatusResult {
    let cmd = SeekCommand {
        session_id: req.session_id,
        phase: req.phase,
        position: req.position,
    };

    let status = state.seek_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// 客户端音频播放出错；更新循环随后释放音频并回到 idle
pub async fn report_error(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReportErrorRequest>,
) -> StatusResult {
    let cmd = ReportPlaybackErrorCommand {
        session_id: req.session_id,
        reason: req.reason,
    };

    let status = state.report_error_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(status)))
}

pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> StatusResult {
    let query = GetSessionStatusQuery {
        session_id: req.session_id,
    };
    let status = state.get_session_status_handler.handle(query).await?;
    Ok(Json(ApiResponse::success(status)))
}

pub async fn session_words(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<SessionWords>>, ApiError> {
    let query = GetSessionWordsQuery {
        session_id: req.session_id,
    };
    let words = state.get_session_words_handler.handle(query).await?;
    Ok(Json(ApiResponse::success(words)))
}

pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<CloseSessionResponseDto>>, ApiError> {
    let cmd = CloseSessionCommand {
        session_id: req.session_id,
    };
    let result = state.close_session_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(CloseSessionResponseDto {
        session_id: result.session_id,
    })))
}
