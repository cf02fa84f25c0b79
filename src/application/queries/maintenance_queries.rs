//! Maintenance Queries - 凭据与缓存状态

/// 缓存统计查询
#[derive(Debug, Clone, Default)]
pub struct GetCacheStatsQuery;

/// 凭据状态查询
#[derive(Debug, Clone, Default)]
pub struct GetCredentialStatusQuery;

/// 凭据状态响应（不回显 key 本身）
#[derive(Debug, Clone)]
pub struct CredentialStatusResponse {
    pub configured: bool,
}
