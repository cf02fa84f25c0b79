//! Maintenance Worker - 后台缓存淘汰与空闲会话清理

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::cache::TtlCache;
use crate::application::playback::PlaybackController;
use crate::domain::speech::AudioEntry;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct MaintenanceWorkerConfig {
    /// 启动后首次淘汰前的等待
    pub eviction_startup_delay: Duration,
    /// 淘汰扫描间隔
    pub eviction_interval: Duration,
    /// 会话空闲超时（秒），0 表示不清理
    pub session_expire_secs: u64,
}

impl Default for MaintenanceWorkerConfig {
    fn default() -> Self {
        Self {
            eviction_startup_delay: Duration::from_secs(5),
            eviction_interval: Duration::from_secs(3600),
            session_expire_secs: 1800,
        }
    }
}

/// 维护 Worker
///
/// 启动延迟后执行第一次淘汰，之后按固定间隔重复；每轮顺带关闭空闲会话
pub struct MaintenanceWorker {
    config: MaintenanceWorkerConfig,
    cache: Arc<TtlCache<AudioEntry>>,
    controller: Arc<PlaybackController>,
}

impl MaintenanceWorker {
    pub fn new(
        config: MaintenanceWorkerConfig,
        cache: Arc<TtlCache<AudioEntry>>,
        controller: Arc<PlaybackController>,
    ) -> Self {
        Self {
            config,
            cache,
            controller,
        }
    }

    /// 启动 Worker，直到 `shutdown` 被取消
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            startup_delay_secs = self.config.eviction_startup_delay.as_secs(),
            interval_secs = self.config.eviction_interval.as_secs(),
            session_expire_secs = self.config.session_expire_secs,
            "MaintenanceWorker started"
        );

        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("MaintenanceWorker stopped");
                return;
            }
            _ = tokio::time::sleep(self.config.eviction_startup_delay) => {}
        }

        let mut interval = tokio::time::interval(self.config.eviction_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => self.run_once().await,
            }
        }

        tracing::info!("MaintenanceWorker stopped");
    }

    /// 执行一轮维护
    pub async fn run_once(&self) {
        match self.cache.evict_expired().await {
            Some(evicted) => tracing::debug!(evicted = evicted, "Scheduled eviction finished"),
            None => tracing::debug!("Scheduled eviction skipped, another sweep in progress"),
        }

        if self.config.session_expire_secs > 0 {
            let closed = self
                .controller
                .close_expired(self.config.session_expire_secs)
                .await;
            if closed > 0 {
                tracing::info!(closed = closed, "Closed idle sessions");
            }
        }
    }
}
