//! TTL Cache - 基于任意 KV 存储的过期缓存
//!
//! - 条目格式: `{ value, creation_date }`，bincode 序列化后写入 KV 存储
//! - 缓存 key: `{namespace}:v{version}:{sha256(text)}`
//! - 读写失败只记录日志，缓存退化为"总是未命中"
//! - 淘汰为惰性扫描，同一时刻只允许一次扫描，重叠的调用直接返回

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::KeyValueStorePort;

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub creation_date: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        // TTL 大到无法表示截止时间时视为永不过期
        now.checked_sub_signed(ttl)
            .is_some_and(|cutoff| self.creation_date < cutoff)
    }
}

/// 缓存配置
#[derive(Debug, Clone)]
pub struct TtlCacheConfig {
    /// key 命名空间
    pub namespace: String,
    /// 条目结构版本，变更后旧条目全部失效
    pub schema_version: u32,
    /// 条目存活时间
    pub ttl: Duration,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            namespace: "storyvoice-tts".to_string(),
            schema_version: 1,
            ttl: Duration::days(7),
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
    pub evicted_count: u64,
    pub eviction_runs: u64,
}

/// 生成缓存 key
///
/// 同一文本总是得到同一 key；SHA-256 保证不同文本不冲突
pub fn cache_key(namespace: &str, schema_version: u32, text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let content_hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}:v{}:{}", namespace, schema_version, content_hash)
}

/// 扫描进行中标记，离开作用域时自动清除
struct EvictionGuard<'a>(&'a AtomicBool);

impl<'a> EvictionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for EvictionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// TTL 缓存
pub struct TtlCache<T> {
    store: Arc<dyn KeyValueStorePort>,
    config: TtlCacheConfig,
    evicting: AtomicBool,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    evicted_count: AtomicU64,
    eviction_runs: AtomicU64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TtlCache<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KeyValueStorePort>, config: TtlCacheConfig) -> Self {
        tracing::info!(
            namespace = %config.namespace,
            schema_version = config.schema_version,
            ttl_secs = config.ttl.num_seconds(),
            "TtlCache initialized"
        );

        Self {
            store,
            config,
            evicting: AtomicBool::new(false),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            evicted_count: AtomicU64::new(0),
            eviction_runs: AtomicU64::new(0),
            _marker: PhantomData,
        }
    }

    pub fn config(&self) -> &TtlCacheConfig {
        &self.config
    }

    /// 文本对应的缓存 key
    pub fn key_for(&self, text: &str) -> String {
        cache_key(&self.config.namespace, self.config.schema_version, text)
    }

    fn key_prefix(&self) -> String {
        format!("{}:", self.config.namespace)
    }

    /// 读取条目
    ///
    /// key 不存在、数据损坏、已过期或存储出错时返回 `None`，从不报错。
    ///
    /// 过期条目在读取时即视为未命中，不等清理任务删除；
    /// 条目本身留在存储中，由 [`Self::evict_expired`] 统一移除。
    pub async fn get_item(&self, key: &str) -> Option<CacheEntry<T>> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Cache read failed");
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let entry: CacheEntry<T> = match bincode::deserialize(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Malformed cache entry");
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if entry.is_expired(Utc::now(), self.config.ttl) {
            tracing::debug!(cache_key = %key, "Cache entry expired");
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        self.hit_count.fetch_add(1, Ordering::Relaxed);
        Some(entry)
    }

    /// 写入条目（覆盖旧值），失败只记录日志
    pub async fn set_item(&self, key: &str, value: &T) {
        let entry = CacheEntry {
            value,
            creation_date: Utc::now(),
        };

        let bytes = match bincode::serialize(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        let size_bytes = bytes.len();
        match self.store.set(key, bytes).await {
            Ok(()) => tracing::debug!(cache_key = %key, size_bytes = size_bytes, "Cache entry written"),
            Err(e) => tracing::error!(cache_key = %key, error = %e, "Cache write failed"),
        }
    }

    /// 清理过期条目
    ///
    /// 已有扫描在进行时直接返回 `None`（合并而非排队）；
    /// 否则返回本次删除的条目数。命名空间内无法解析的条目也一并删除。
    pub async fn evict_expired(&self) -> Option<usize> {
        let _guard = match EvictionGuard::acquire(&self.evicting) {
            Some(guard) => guard,
            None => {
                tracing::debug!("Eviction already in progress, skipping");
                return None;
            }
        };

        self.eviction_runs.fetch_add(1, Ordering::Relaxed);

        let keys = match self.store.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to enumerate cache keys");
                return Some(0);
            }
        };

        let prefix = self.key_prefix();
        let now = Utc::now();
        let mut evicted = 0usize;

        for key in keys.iter().filter(|k| k.starts_with(&prefix)) {
            let bytes = match self.store.get(key).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(cache_key = %key, error = %e, "Cache read failed during eviction");
                    continue;
                }
            };

            let expired = match bincode::deserialize::<CacheEntry<T>>(&bytes) {
                Ok(entry) => entry.is_expired(now, self.config.ttl),
                Err(_) => true,
            };
            if !expired {
                continue;
            }

            match self.store.delete(key).await {
                Ok(()) => {
                    evicted += 1;
                    tracing::debug!(cache_key = %key, "Evicted cache entry");
                }
                Err(e) => tracing::warn!(cache_key = %key, error = %e, "Failed to evict cache entry"),
            }
        }

        self.evicted_count.fetch_add(evicted as u64, Ordering::Relaxed);
        tracing::info!(scanned = keys.len(), evicted = evicted, "Cache eviction finished");
        Some(evicted)
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            evicted_count: self.evicted_count.load(Ordering::Relaxed),
            eviction_runs: self.eviction_runs.load(Ordering::Relaxed),
        }
    }
}
