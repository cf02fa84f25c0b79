//! Ping Handler

use axum::Json;
use serde::Serialize;

use crate::infrastructure::http::dto::ApiResponse;

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// 健康检查
pub async fn ping() -> Json<ApiResponse<PingResponse>> {
    Json(ApiResponse::success(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
