//! Playback Context - 播放限界上下文
//!
//! 职责:
//! - 播放会话（PlayerSession）的状态机
//! - 拖动进度、高亮下标等会话内状态
//! - 推送给订阅者的播放事件

mod aggregate;
mod errors;
mod events;
mod value_objects;

pub use aggregate::PlayerSession;
pub use errors::PlaybackError;
pub use events::PlaybackEvent;
pub use value_objects::{AudioHandle, PlaybackState};
