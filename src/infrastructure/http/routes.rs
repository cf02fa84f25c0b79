//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                 GET   健康检查
//! - /api/session/create       POST  创建播放会话
//! - /api/session/play         POST  开始播放（必要时触发合成）
//! - /api/session/pause        POST  暂停
//! - /api/session/resume       POST  继续
//! - /api/session/stop         POST  停止
//! - /api/session/seek         POST  拖动进度（begin / preview / commit）
//! - /api/session/error        POST  上报客户端播放错误
//! - /api/session/status       POST  会话状态
//! - /api/session/words        POST  分词与时间表
//! - /api/session/close        POST  关闭会话
//! - /api/audio/{session_id}   GET   会话音频
//! - /api/credential           POST  设置 API key
//! - /api/credential/status    GET   API key 是否已配置
//! - /api/cache/stats          GET   缓存统计
//! - /api/cache/evict          POST  手动淘汰过期缓存
//! - /ws/session/{id}          WS    播放事件推送

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/session/:session_id", get(handlers::websocket_handler))
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/session", session_routes())
        .route("/audio/:session_id", get(handlers::get_audio))
        .route("/credential", post(handlers::set_credential))
        .route("/credential/status", get(handlers::credential_status))
        .route("/cache/stats", get(handlers::cache_stats))
        .route("/cache/evict", post(handlers::evict_cache))
}

/// Session 路由
fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_session))
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/resume", post(handlers::resume))
        .route("/stop", post(handlers::stop))
        .route("/seek", post(handlers::seek))
        .route("/error", post(handlers::report_error))
        .route("/status", post(handlers::session_status))
        .route("/words", post(handlers::session_words))
        .route("/close", post(handlers::close_session))
}
