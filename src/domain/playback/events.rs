//! Playback Context - Domain Events

use serde::{Deserialize, Serialize};

/// 播放事件（推送给会话的订阅者）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PlaybackEvent {
    /// 状态变更
    StateChanged {
        session_id: String,
        state: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 播放进度
    Progress {
        session_id: String,
        position: f64,
        duration: f64,
        seeking: bool,
    },
    /// 高亮单词变化，`None` 表示清除高亮
    Highlight {
        session_id: String,
        index: Option<usize>,
    },
    /// 会话关闭
    SessionClosed {
        session_id: String,
        reason: String,
    },
}

impl PlaybackEvent {
    pub fn session_id(&self) -> &str {
        match self {
            Self::StateChanged { session_id, .. }
            | Self::Progress { session_id, .. }
            | Self::Highlight { session_id, .. }
            | Self::SessionClosed { session_id, .. } => session_id,
        }
    }
}
