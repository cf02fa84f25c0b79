//! Playback Commands - 播放会话相关命令

use serde::Deserialize;

/// 创建会话命令
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub text: String,
    pub locale: Option<String>,
}

/// 创建会话响应
#[derive(Debug, Clone)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub word_count: usize,
}

/// 播放控制动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAction {
    Play,
    Pause,
    Resume,
    Stop,
}

/// 播放控制命令
#[derive(Debug, Clone)]
pub struct PlaybackCommand {
    pub session_id: String,
    pub action: PlaybackAction,
}

/// 拖动阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekPhase {
    /// 按下
    Begin,
    /// 拖动中
    Preview,
    /// 松开
    Commit,
}

/// 拖动命令
#[derive(Debug, Clone)]
pub struct SeekCommand {
    pub session_id: String,
    pub phase: SeekPhase,
    /// 目标位置（秒），`begin` 阶段可省略
    pub position: Option<f64>,
}

/// 上报播放错误命令（客户端音频元素的 error 事件）
#[derive(Debug, Clone)]
pub struct ReportPlaybackErrorCommand {
    pub session_id: String,
    pub reason: String,
}

/// 关闭会话命令
#[derive(Debug, Clone)]
pub struct CloseSessionCommand {
    pub session_id: String,
}

/// 关闭会话响应
#[derive(Debug, Clone)]
pub struct CloseSessionResponse {
    pub session_id: String,
}
