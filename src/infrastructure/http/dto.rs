//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{
    CacheStats, CredentialStatusResponse, EvictCacheResponse, PlaybackStatus, SeekPhase,
};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Session DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub text: String,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponseDto {
    pub session_id: String,
    pub word_count: usize,
}

/// 只携带 session_id 的请求（play / pause / resume / stop / status / words / close）
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub session_id: String,
    pub phase: SeekPhase,
    #[serde(default)]
    pub position: Option<f64>,
}

/// 客户端播放音频失败时上报
#[derive(Debug, Deserialize)]
pub struct ReportErrorRequest {
    pub session_id: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct CloseSessionResponseDto {
    pub session_id: String,
}

pub type PlaybackStatusDto = PlaybackStatus;

// ============================================================================
// Maintenance DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetCredentialRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct CredentialStatusDto {
    pub configured: bool,
}

impl From<CredentialStatusResponse> for CredentialStatusDto {
    fn from(r: CredentialStatusResponse) -> Self {
        Self {
            configured: r.configured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EvictCacheResponseDto {
    /// 已有清理在进行时为 false
    pub started: bool,
    pub evicted: usize,
}

impl From<EvictCacheResponse> for EvictCacheResponseDto {
    fn from(r: EvictCacheResponse) -> Self {
        Self {
            started: r.evicted.is_some(),
            evicted: r.evicted.unwrap_or(0),
        }
    }
}

pub type CacheStatsDto = CacheStats;
