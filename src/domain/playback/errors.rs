//! Playback Context - Errors

use thiserror::Error;

use super::PlaybackState;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("非法的状态迁移: {from} -> {to}")]
    InvalidTransition {
        from: PlaybackState,
        to: PlaybackState,
    },

    #[error("会话未持有音频")]
    NoAudio,

    #[error("音频解码失败: {0}")]
    DecodeFailed(String),

    #[error("音频输出错误: {0}")]
    OutputFailed(String),

    #[error("语音合成失败: {0}")]
    SynthesisFailed(String),
}
