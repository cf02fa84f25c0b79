//! Session Queries - 播放会话查询

use std::sync::Arc;

use crate::domain::speech::AudioEntry;

/// 会话状态查询
#[derive(Debug, Clone)]
pub struct GetSessionStatusQuery {
    pub session_id: String,
}

/// 会话分词与时间表查询
#[derive(Debug, Clone)]
pub struct GetSessionWordsQuery {
    pub session_id: String,
}

/// 会话音频查询
#[derive(Debug, Clone)]
pub struct GetAudioQuery {
    pub session_id: String,
}

/// 会话音频响应
#[derive(Debug, Clone)]
pub struct GetAudioResponse {
    pub entry: Arc<AudioEntry>,
}

impl GetAudioResponse {
    pub fn content_type(&self) -> &str {
        &self.entry.content_type
    }

    pub fn audio_data(&self) -> &[u8] {
        &self.entry.audio
    }
}
