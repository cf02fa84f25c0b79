//! Fake TTS Client - 离线运行与测试用的 TTS 客户端
//!
//! 不发网络请求：按文本长度生成静音 WAV，并给每个字符均匀分配时间

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{SynthesisRequest, TtsEnginePort, TtsError};
use crate::domain::speech::{AlignmentData, AudioEntry};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 每个字符的朗读时长（秒）
    pub seconds_per_char: f64,
    /// 采样率
    pub sample_rate: u32,
    /// 模拟网络延迟
    pub latency: Duration,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            seconds_per_char: 0.06,
            sample_rate: 16000,
            latency: Duration::from_millis(200),
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            seconds_per_char = config.seconds_per_char,
            sample_rate = config.sample_rate,
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    fn alignment_for(&self, text: &str) -> AlignmentData {
        let step = self.config.seconds_per_char;
        let characters: Vec<String> = text.chars().map(|c| c.to_string()).collect();
        let n = characters.len();
        AlignmentData {
            characters,
            start_times: (0..n).map(|i| i as f64 * step).collect(),
            end_times: (1..=n).map(|i| i as f64 * step).collect(),
        }
    }
}

/// 生成 16-bit 单声道静音 WAV
pub fn silent_wav(duration_secs: f64, sample_rate: u32) -> Vec<u8> {
    let num_samples = (duration_secs.max(0.0) * sample_rate as f64).round() as u32;
    let data_size = num_samples * 2;
    let byte_rate = sample_rate * 2;

    let mut wav = Vec::with_capacity(44 + data_size as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk: PCM, mono, 16 bit
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.resize(44 + data_size as usize, 0);
    wav
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        _api_key: &str,
    ) -> Result<AudioEntry, TtsError> {
        tracing::debug!(
            text_chars = request.text.chars().count(),
            voice_id = %request.voice_id,
            "FakeTtsClient: generating silent audio"
        );

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let alignment = self.alignment_for(&request.text);
        let duration = alignment.last_end_time().unwrap_or(0.0);

        Ok(AudioEntry {
            audio: silent_wav(duration, self.config.sample_rate),
            content_type: "audio/wav".to_string(),
            alignment: Some(alignment),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::speech::{OutputFormat, VoiceSettings};

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: text.to_string(),
            voice_id: "fake".to_string(),
            model_id: "fake".to_string(),
            language_code: None,
            output_format: OutputFormat::default(),
            voice_settings: VoiceSettings::default(),
        }
    }

    #[test]
    fn test_silent_wav_layout() {
        let wav = silent_wav(0.5, 16000);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 16000);
        assert!(wav[44..].iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn test_alignment_covers_every_char() {
        let client = FakeTtsClient::new(FakeTtsClientConfig {
            latency: Duration::ZERO,
            ..Default::default()
        });

        let entry = client.synthesize(&request("Año 42"), "unused").await.unwrap();
        let alignment = entry.alignment.unwrap();

        assert_eq!(alignment.consistent_len(), Some(6));
        assert_eq!(alignment.characters[1], "ñ");
        assert!((alignment.last_end_time().unwrap() - 0.36).abs() < 1e-9);
        assert_eq!(entry.content_type, "audio/wav");
    }
}
