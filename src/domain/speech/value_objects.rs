//! Speech Context - Value Objects

use serde::{Deserialize, Serialize};

use super::AlignmentData;

/// 合成输出格式（如 `mp3_44100_128`、`pcm_22050`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat(String);

impl OutputFormat {
    pub fn new(format: impl Into<String>) -> Self {
        Self(format.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 由输出格式推导 MIME 类型
    ///
    /// `mp3*` → `audio/mpeg`，`pcm*` → `audio/pcm`，其余按 `audio/mpeg` 处理
    pub fn content_type(&self) -> &'static str {
        let format = self.0.to_ascii_lowercase();
        if format.starts_with("pcm") {
            "audio/pcm"
        } else {
            "audio/mpeg"
        }
    }

    /// `pcm_<rate>` 格式的采样率
    pub fn pcm_sample_rate(&self) -> Option<u32> {
        let format = self.0.to_ascii_lowercase();
        format.strip_prefix("pcm_")?.split('_').next()?.parse().ok()
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new("mp3_44100_128")
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 音色参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    #[serde(default)]
    pub style: f32,
    #[serde(default = "default_speaker_boost")]
    pub use_speaker_boost: bool,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_speaker_boost() -> bool {
    true
}

fn default_speed() -> f32 {
    1.0
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: default_speaker_boost(),
            speed: default_speed(),
        }
    }
}

impl VoiceSettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(0.0..=1.0).contains(&self.stability) {
            return Err("stability 必须在 0.0 到 1.0 之间");
        }
        if !(0.0..=1.0).contains(&self.similarity_boost) {
            return Err("similarity_boost 必须在 0.0 到 1.0 之间");
        }
        if !(0.0..=1.0).contains(&self.style) {
            return Err("style 必须在 0.0 到 1.0 之间");
        }
        if !(0.7..=1.2).contains(&self.speed) {
            return Err("speed 必须在 0.7 到 1.2 之间");
        }
        Ok(())
    }
}

/// 缓存的合成结果
///
/// 存入缓存后归缓存所有；播放会话只持有 `Arc` 引用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioEntry {
    pub audio: Vec<u8>,
    pub content_type: String,
    pub alignment: Option<AlignmentData>,
}

impl AudioEntry {
    pub fn size_bytes(&self) -> usize {
        self.audio.len()
    }
}
