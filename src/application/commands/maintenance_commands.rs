//! Maintenance Commands - 凭据与缓存维护

/// 设置 API key
#[derive(Debug, Clone)]
pub struct SetCredentialCommand {
    pub api_key: String,
}

/// 手动触发缓存淘汰
#[derive(Debug, Clone, Default)]
pub struct EvictCacheCommand;

/// 缓存淘汰响应
#[derive(Debug, Clone)]
pub struct EvictCacheResponse {
    /// 删除条目数；已有扫描进行中时为 `None`
    pub evicted: Option<usize>,
}
