//! Audio Output Port - 全局唯一的音频输出
//!
//! 同一时刻只有一个音频源绑定在输出上；绑定新源会替换旧源。
//! 哪个会话拥有这次绑定由 PlaybackController 的 AudioBinding 决定，输出本身不关心会话。

use std::sync::Arc;

use crate::domain::playback::{AudioHandle, PlaybackError};
use crate::domain::speech::AudioEntry;

/// Audio Output Port
pub trait AudioOutputPort: Send + Sync {
    /// 解码合成结果得到可播放的句柄（探测时长）
    fn decode(&self, entry: Arc<AudioEntry>) -> Result<AudioHandle, PlaybackError>;

    /// 将句柄绑定到输出，位置归零、处于暂停
    fn bind(&self, handle: &AudioHandle) -> Result<(), PlaybackError>;

    fn play(&self) -> Result<(), PlaybackError>;

    fn pause(&self);

    /// 设置播放位置（秒）
    fn set_position(&self, seconds: f64);

    /// 当前播放位置（秒）
    fn position(&self) -> f64;

    /// 是否已播放到结尾
    fn is_ended(&self) -> bool;

    /// 记录一次播放错误（客户端音频元素的 error 事件）
    fn report_error(&self, reason: &str);

    /// 取出尚未处理的播放错误
    fn take_error(&self) -> Option<String>;

    /// 解除绑定并停止输出
    fn release(&self);
}
