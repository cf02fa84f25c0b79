//! Event Publisher Port - 播放事件出口
//!
//! 具体实现（WebSocket 广播）在 infrastructure/events 层

use crate::domain::playback::PlaybackEvent;

pub trait PlaybackEventPort: Send + Sync {
    /// 发布事件；没有订阅者时静默丢弃
    fn publish(&self, event: PlaybackEvent);

    /// 会话关闭后释放其事件通道
    fn release_session(&self, session_id: &str);
}
