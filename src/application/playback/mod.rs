//! 播放编排
//!
//! - binding: 音频输出的单一所有者登记
//! - controller: 会话状态机与更新循环

mod binding;
mod controller;

pub use binding::{AudioBinding, BindingTicket};
pub use controller::{PlaybackController, PlaybackSettings, PlaybackStatus, SessionWords};
