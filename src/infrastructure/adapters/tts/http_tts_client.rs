//! HTTP TTS Client - 调用带时间戳的语音合成 HTTP API
//!
//! 实现 TtsEnginePort trait
//!
//! 外部 TTS API:
//! POST {base_url}/v1/text-to-speech/{voice_id}/with-timestamps?output_format=...
//! Header: xi-api-key
//! Request: {"text", "model_id", "language_code", "output_format", "voice_settings"}  (JSON)
//! Response: {"audio_base64", "alignment": {"characters", "character_start_times_seconds",
//!            "character_end_times_seconds"}}

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{SynthesisRequest, TtsEnginePort, TtsError};
use crate::domain::speech::{AlignmentData, AudioEntry, OutputFormat, VoiceSettings};

const API_KEY_HEADER: &str = "xi-api-key";

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SpeechHttpRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
    output_format: &'a str,
    voice_settings: &'a VoiceSettings,
}

/// 合成响应体
#[derive(Debug, Deserialize)]
struct SpeechHttpResponse {
    audio_base64: String,
    #[serde(default)]
    alignment: Option<AlignmentHttpBody>,
}

#[derive(Debug, Deserialize)]
struct AlignmentHttpBody {
    #[serde(default)]
    characters: Vec<String>,
    #[serde(default)]
    character_start_times_seconds: Vec<f64>,
    #[serde(default)]
    character_end_times_seconds: Vec<f64>,
}

impl From<AlignmentHttpBody> for AlignmentData {
    fn from(body: AlignmentHttpBody) -> Self {
        Self {
            characters: body.characters,
            start_times: body.character_start_times_seconds,
            end_times: body.character_end_times_seconds,
        }
    }
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            timeout_secs: 15,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 使用默认配置创建客户端
    pub fn with_default_config() -> Result<Self, TtsError> {
        Self::new(HttpTtsClientConfig::default())
    }

    /// 获取合成 URL
    fn synthesis_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}/with-timestamps",
            self.config.base_url.trim_end_matches('/'),
            voice_id
        )
    }

    fn health_url(&self) -> String {
        format!("{}/v1/models", self.config.base_url.trim_end_matches('/'))
    }
}

/// 解析响应体：解码 base64 音频并提取对齐数据
fn parse_response(body: &[u8], format: &OutputFormat) -> Result<AudioEntry, TtsError> {
    let parsed: SpeechHttpResponse = serde_json::from_slice(body)
        .map_err(|e| TtsError::InvalidResponse(format!("Malformed body: {}", e)))?;

    if parsed.audio_base64.is_empty() {
        return Err(TtsError::InvalidResponse("Empty audio_base64".to_string()));
    }

    let audio = STANDARD
        .decode(parsed.audio_base64.as_bytes())
        .map_err(|e| TtsError::InvalidResponse(format!("Invalid base64 audio: {}", e)))?;

    Ok(AudioEntry {
        audio,
        content_type: format.content_type().to_string(),
        alignment: parsed.alignment.map(AlignmentData::from),
    })
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        api_key: &str,
    ) -> Result<AudioEntry, TtsError> {
        let body = SpeechHttpRequest {
            text: &request.text,
            model_id: &request.model_id,
            language_code: request.language_code.as_deref(),
            output_format: request.output_format.as_str(),
            voice_settings: &request.voice_settings,
        };
        let url = self.synthesis_url(&request.voice_id);

        tracing::debug!(
            url = %url,
            text_chars = request.text.chars().count(),
            model_id = %request.model_id,
            output_format = %request.output_format,
            "Sending TTS request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", request.output_format.as_str())])
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read body: {}", e)))?;

        let entry = parse_response(&bytes, &request.output_format)?;

        tracing::info!(
            audio_size = entry.size_bytes(),
            content_type = %entry.content_type,
            alignment_chars = entry.alignment.as_ref().map(|a| a.characters.len()),
            "TTS synthesis completed"
        );

        Ok(entry)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(&self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpTtsClientConfig::default();
        assert_eq!(config.base_url, "https://api.elevenlabs.io");
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpTtsClientConfig::new("http://example.com:9000/").with_timeout(60);
        let client = HttpTtsClient::new(config).unwrap();
        assert_eq!(
            client.synthesis_url("voice-1"),
            "http://example.com:9000/v1/text-to-speech/voice-1/with-timestamps"
        );
        assert_eq!(client.config.timeout_secs, 60);
    }

    #[test]
    fn test_request_body_shape() {
        let settings = VoiceSettings::default();
        let body = SpeechHttpRequest {
            text: "Hi",
            model_id: "m1",
            language_code: None,
            output_format: "mp3_44100_128",
            voice_settings: &settings,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["text"], "Hi");
        assert_eq!(json["output_format"], "mp3_44100_128");
        assert!(json.get("language_code").is_none());
        assert_eq!(json["voice_settings"]["similarity_boost"], 0.75);
    }

    #[test]
    fn test_parse_response_with_alignment() {
        let body = serde_json::json!({
            "audio_base64": STANDARD.encode([1u8, 2, 3]),
            "alignment": {
                "characters": ["H", "i"],
                "character_start_times_seconds": [0.0, 0.1],
                "character_end_times_seconds": [0.1, 0.2]
            }
        });
        let bytes = serde_json::to_vec(&body).unwrap();

        let entry = parse_response(&bytes, &OutputFormat::new("mp3_44100_128")).unwrap();
        assert_eq!(entry.audio, vec![1, 2, 3]);
        assert_eq!(entry.content_type, "audio/mpeg");
        let alignment = entry.alignment.unwrap();
        assert_eq!(alignment.characters, vec!["H", "i"]);
        assert_eq!(alignment.end_times, vec![0.1, 0.2]);
    }

    #[test]
    fn test_parse_response_without_alignment() {
        let body = serde_json::json!({ "audio_base64": STANDARD.encode([0u8; 4]) });
        let bytes = serde_json::to_vec(&body).unwrap();

        let entry = parse_response(&bytes, &OutputFormat::new("pcm_16000")).unwrap();
        assert_eq!(entry.content_type, "audio/pcm");
        assert!(entry.alignment.is_none());
    }

    #[test]
    fn test_parse_response_rejects_bad_payloads() {
        let format = OutputFormat::default();
        assert!(matches!(
            parse_response(b"not json", &format),
            Err(TtsError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_response(br#"{"audio_base64": "@@@"}"#, &format),
            Err(TtsError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_response(br#"{"audio_base64": ""}"#, &format),
            Err(TtsError::InvalidResponse(_))
        ));
    }
}
