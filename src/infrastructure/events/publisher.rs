//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现：每个会话一个广播通道

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::PlaybackEventPort;
use crate::domain::playback::PlaybackEvent;

/// 单个会话通道的缓冲大小；进度事件频繁，慢订阅者会丢弃旧事件
const SESSION_CHANNEL_CAPACITY: usize = 256;

/// 事件发布器
pub struct EventPublisher {
    /// session_id -> broadcast sender
    session_channels: DashMap<String, broadcast::Sender<PlaybackEvent>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            session_channels: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 注册会话的事件通道（已存在时复用）
    pub fn register_session(&self, session_id: &str) -> broadcast::Receiver<PlaybackEvent> {
        self.session_channels
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(SESSION_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 取消注册会话
    pub fn unregister_session(&self, session_id: &str) {
        self.session_channels.remove(session_id);
    }

    /// 没有订阅者时移除会话通道，返回是否已移除
    pub fn prune_session(&self, session_id: &str) -> bool {
        self.session_channels
            .remove_if(session_id, |_, sender| sender.receiver_count() == 0)
            .is_some()
    }

    /// 获取会话的事件接收器
    pub fn subscribe(&self, session_id: &str) -> Option<broadcast::Receiver<PlaybackEvent>> {
        self.session_channels.get(session_id).map(|s| s.subscribe())
    }

    /// 发布事件到指定会话
    fn publish_to_session(&self, event: PlaybackEvent) {
        let session_id = event.session_id().to_string();
        if let Some(sender) = self.session_channels.get(&session_id) {
            if let Err(e) = sender.send(event) {
                tracing::trace!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEventPort for EventPublisher {
    fn publish(&self, event: PlaybackEvent) {
        self.publish_to_session(event);
    }

    fn release_session(&self, session_id: &str) {
        self.unregister_session(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_registered_session_only() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.register_session("s1");
        let mut other = publisher.register_session("s2");

        publisher.publish(PlaybackEvent::Highlight {
            session_id: "s1".to_string(),
            index: Some(2),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session_id(), "s1");
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_release_drops_channel() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.register_session("s1");

        publisher.release_session("s1");
        assert!(publisher.subscribe("s1").is_none());
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));

        // 未注册的会话静默丢弃
        publisher.publish(PlaybackEvent::SessionClosed {
            session_id: "s1".to_string(),
            reason: "closed".to_string(),
        });
    }

    #[test]
    fn test_prune_keeps_channel_with_subscribers() {
        let publisher = EventPublisher::new();
        let first = publisher.register_session("s1");
        let second = publisher.register_session("s1");

        drop(first);
        assert!(!publisher.prune_session("s1"));
        assert!(publisher.subscribe("s1").is_some());

        drop(second);
        // subscribe() 创建的接收器已随断言释放
        assert!(publisher.prune_session("s1"));
        assert!(publisher.subscribe("s1").is_none());
    }
}
