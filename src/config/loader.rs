//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, CacheBackend, TtsProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `STORYVOICE_SERVER__PORT=8080`
/// - `STORYVOICE_TTS__PROVIDER=fake`
/// - `STORYVOICE_CACHE__BACKEND=sqlite`
/// - `STORYVOICE_CACHE__PATH=/data/storyvoice.db`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// `config_path` 为 None 时搜索工作目录下的 config.toml / config.local.toml
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 其余字段的默认值由 serde default 提供
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("tts.provider", "http")?
        .set_default("tts.timeout_secs", 15)?
        .set_default("cache.backend", "sled")?
        .set_default("cache.ttl_secs", 7 * 24 * 3600)?
        .set_default("playback.tick_ms", 16)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: STORYVOICE_TTS__URL=http://localhost:9000
    builder = builder.add_source(
        Environment::with_prefix("STORYVOICE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return invalid("Server port cannot be 0");
    }

    if config.tts.provider == TtsProvider::Http && config.tts.url.trim().is_empty() {
        return invalid("TTS URL cannot be empty");
    }
    if config.tts.timeout_secs == 0 {
        return invalid("TTS timeout cannot be 0");
    }
    if config.tts.voice_id.trim().is_empty() {
        return invalid("TTS voice_id cannot be empty");
    }
    if config.tts.output_format.trim().is_empty() {
        return invalid("TTS output_format cannot be empty");
    }
    if let Err(msg) = config.tts.voice_settings.validate() {
        return Err(ConfigError::ValidationError(format!(
            "Invalid voice settings: {}",
            msg
        )));
    }

    if config.cache.backend != CacheBackend::Memory && config.cache.path.trim().is_empty() {
        return invalid("Cache path cannot be empty");
    }
    if config.cache.namespace.is_empty() || config.cache.namespace.contains(':') {
        return invalid("Cache namespace must be non-empty and must not contain ':'");
    }
    if config.cache.ttl_secs == 0 {
        return invalid("Cache TTL cannot be 0");
    }
    if config.cache.eviction_interval_secs == 0 {
        return invalid("Eviction interval cannot be 0");
    }

    if config.playback.tick_ms == 0 {
        return invalid("Playback tick interval cannot be 0");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if config.server.static_files.enabled {
        tracing::info!(
            "Static Files: {:?} at {}",
            config.server.static_files.dir,
            config.server.static_files.path
        );
    }
    tracing::info!("TTS Provider: {:?}", config.tts.provider);
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!("TTS Voice: {}", config.tts.voice_id);
    tracing::info!("TTS Output Format: {}", config.tts.output_format);
    tracing::info!(
        "TTS API Key: {}",
        if config.tts.api_key.is_some() { "configured" } else { "not set" }
    );
    tracing::info!("Cache Backend: {:?}", config.cache.backend);
    tracing::info!("Cache Path: {}", config.cache.path);
    tracing::info!(
        "Cache Namespace: {}:v{}",
        config.cache.namespace,
        config.cache.schema_version
    );
    tracing::info!("Cache TTL: {}s", config.cache.ttl_secs);
    tracing::info!("Eviction Interval: {}s", config.cache.eviction_interval_secs);
    tracing::info!("Playback Tick: {}ms", config.playback.tick_ms);
    tracing::info!("Segmenter: {:?}", config.playback.segmenter);
    tracing::info!("Session Expire: {}s", config.playback.session_expire_secs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
