//! Speech Synthesizer - 凭据、超时、缓存与 TTS 引擎的组合
//!
//! 每次成功合成都会在返回前写入缓存；任何失败都只返回 `None` 并记录原因。

use std::sync::Arc;
use std::time::Duration;

use crate::application::cache::{CacheStats, TtlCache};
use crate::application::credentials::CredentialResolver;
use crate::application::ports::{SynthesisRequest, TtsEnginePort, TtsError};
use crate::domain::speech::{AudioEntry, OutputFormat, VoiceSettings};

/// 合成参数（来自 `[tts]` 配置段）
#[derive(Debug, Clone)]
pub struct SynthesizerSettings {
    pub voice_id: String,
    pub model_id: String,
    pub language_code: Option<String>,
    pub output_format: OutputFormat,
    pub voice_settings: VoiceSettings,
    pub timeout: Duration,
}

impl Default for SynthesizerSettings {
    fn default() -> Self {
        Self {
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            language_code: None,
            output_format: OutputFormat::default(),
            voice_settings: VoiceSettings::default(),
            timeout: Duration::from_secs(15),
        }
    }
}

pub struct SpeechSynthesizer {
    engine: Arc<dyn TtsEnginePort>,
    cache: Arc<TtlCache<AudioEntry>>,
    credentials: Arc<CredentialResolver>,
    settings: SynthesizerSettings,
}

impl SpeechSynthesizer {
    pub fn new(
        engine: Arc<dyn TtsEnginePort>,
        cache: Arc<TtlCache<AudioEntry>>,
        credentials: Arc<CredentialResolver>,
        settings: SynthesizerSettings,
    ) -> Self {
        Self {
            engine,
            cache,
            credentials,
            settings,
        }
    }

    pub fn settings(&self) -> &SynthesizerSettings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<TtlCache<AudioEntry>> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// 只查缓存，不发网络请求
    pub async fn lookup(&self, text: &str) -> Option<AudioEntry> {
        let key = self.cache.key_for(text);
        let entry = self.cache.get_item(&key).await?;
        tracing::debug!(cache_key = %key, "Synthesis cache hit");
        Some(entry.value)
    }

    /// 调用 TTS 引擎合成文本
    ///
    /// `before_network` 在请求发出前调用且只调用一次；
    /// 凭据缺失或文本为空时不会调用。
    pub async fn synthesize<F>(&self, text: &str, before_network: F) -> Option<AudioEntry>
    where
        F: FnOnce() + Send,
    {
        if text.trim().is_empty() {
            tracing::warn!("Refusing to synthesize empty text");
            return None;
        }

        let api_key = self.credentials.resolve().await?;
        let request = self.build_request(text);

        before_network();

        let started = std::time::Instant::now();
        let result =
            match tokio::time::timeout(self.settings.timeout, self.engine.synthesize(&request, &api_key))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(TtsError::Timeout),
            };

        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    text_chars = text.chars().count(),
                    timeout_secs = self.settings.timeout.as_secs(),
                    "Speech synthesis failed"
                );
                return None;
            }
        };

        let key = self.cache.key_for(text);
        self.cache.set_item(&key, &entry).await;

        tracing::info!(
            cache_key = %key,
            size_bytes = entry.size_bytes(),
            has_alignment = entry.alignment.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Speech synthesized"
        );

        Some(entry)
    }

    fn build_request(&self, text: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: text.to_string(),
            voice_id: self.settings.voice_id.clone(),
            model_id: self.settings.model_id.clone(),
            language_code: self.settings.language_code.clone(),
            output_format: self.settings.output_format.clone(),
            voice_settings: self.settings.voice_settings.clone(),
        }
    }
}
