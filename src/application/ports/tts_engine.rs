//! TTS Engine Port - 语音合成 API 抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::speech::{AudioEntry, OutputFormat, VoiceSettings};

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing credential")]
    MissingCredential,
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub language_code: Option<String>,
    pub output_format: OutputFormat,
    pub voice_settings: VoiceSettings,
}

/// TTS Engine Port
///
/// 一次调用对应一次网络请求；解码后的音频与对齐数据以 [`AudioEntry`] 返回
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        api_key: &str,
    ) -> Result<AudioEntry, TtsError>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
