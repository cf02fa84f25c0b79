//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Speech Context: 合成结果与对齐映射
//! - Playback Context: 播放会话状态机

pub mod playback;
pub mod speech;

// 共享的分词器
pub mod text_segmenter;

pub use text_segmenter::{probe_segmenter, SegmenterMode, WordSegmenter, WordSpan};
