//! Speech Context - 语音合成限界上下文
//!
//! 职责:
//! - 合成结果（音频 + 字符对齐）的值对象
//! - 单词时间表构建与高亮查找

mod alignment;
mod value_objects;

pub use alignment::{build_word_timings, highlighted_index_at, AlignmentData, WordTiming};
pub use value_objects::{AudioEntry, OutputFormat, VoiceSettings};
