//! Playback Context - Value Objects

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::speech::AudioEntry;

/// 播放状态
///
/// ```text
/// idle → loading → playing ⇄ paused → idle
///          ↓          ↓
///        error  ←─────┘   （error 随即回落到 idle）
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading => "loading",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Error => "error",
        }
    }

    /// 是否允许迁移到目标状态
    pub fn can_transition_to(&self, next: PlaybackState) -> bool {
        use PlaybackState::*;
        matches!(
            (self, next),
            (Idle, Loading)
                | (Idle, Playing)
                | (Loading, Playing)
                | (Loading, Error)
                | (Loading, Idle)
                | (Playing, Paused)
                | (Playing, Idle)
                | (Playing, Error)
                | (Paused, Playing)
                | (Paused, Idle)
                | (Error, Idle)
        )
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已解码的音频资源
///
/// 会话持有期间资源保持有效；丢弃句柄即释放（revoke）。
#[derive(Debug, Clone)]
pub struct AudioHandle {
    entry: Arc<AudioEntry>,
    duration: f64,
}

impl AudioHandle {
    pub fn new(entry: Arc<AudioEntry>, duration: f64) -> Self {
        Self { entry, duration }
    }

    pub fn entry(&self) -> &Arc<AudioEntry> {
        &self.entry
    }

    /// 音频时长（秒）
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn content_type(&self) -> &str {
        &self.entry.content_type
    }
}
