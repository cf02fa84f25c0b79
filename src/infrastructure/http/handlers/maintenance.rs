//! Credential & Cache Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    EvictCacheCommand, GetCacheStatsQuery, GetCredentialStatusQuery, SetCredentialCommand,
};
use crate::infrastructure::http::dto::{
    ApiResponse, CacheStatsDto, CredentialStatusDto, Empty, EvictCacheResponseDto,
    SetCredentialRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn set_credential(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetCredentialRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .set_credential_handler
        .handle(SetCredentialCommand {
            api_key: req.api_key,
        })
        .await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn credential_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CredentialStatusDto>>, ApiError> {
    let status = state
        .get_credential_status_handler
        .handle(GetCredentialStatusQuery)
        .await?;
    Ok(Json(ApiResponse::success(status.into())))
}

pub async fn cache_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CacheStatsDto>>, ApiError> {
    let stats = state.get_cache_stats_handler.handle(GetCacheStatsQuery).await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub async fn evict_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<EvictCacheResponseDto>>, ApiError> {
    let result = state.evict_cache_handler.handle(EvictCacheCommand).await?;
    Ok(Json(ApiResponse::success(result.into())))
}
