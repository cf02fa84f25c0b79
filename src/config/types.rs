//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::speech::{OutputFormat, VoiceSettings};
use crate::domain::text_segmenter::SegmenterMode;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音合成配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// URL 路径前缀
    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_static_path() -> String {
    "/".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_static_dir(),
            path: default_static_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 合成引擎实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsProvider {
    /// 远程语音合成 API
    #[default]
    Http,
    /// 本地静音生成（开发与演示用）
    Fake,
}

/// 语音合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsProvider,

    /// 合成服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// 可选的语言代码（如 `en`）
    #[serde(default)]
    pub language_code: Option<String>,

    /// 如 `mp3_44100_128`、`pcm_16000`
    #[serde(default = "default_output_format")]
    pub output_format: String,

    #[serde(default)]
    pub voice_settings: VoiceSettings,

    /// 直接配置的 API key；存储中没有 key 时才会使用
    #[serde(default)]
    pub api_key: Option<String>,

    /// 读取 API key 的环境变量名
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
}

fn default_tts_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_tts_timeout() -> u64 {
    15
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_output_format() -> String {
    OutputFormat::default().as_str().to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("ELEVENLABS_API_KEY".to_string())
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            voice_id: default_voice_id(),
            model_id: default_model_id(),
            language_code: None,
            output_format: default_output_format(),
            voice_settings: VoiceSettings::default(),
            api_key: None,
            api_key_env: default_api_key_env(),
        }
    }
}

impl TtsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::new(self.output_format.clone())
    }
}

/// KV 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Sled,
    Sqlite,
    /// 进程内，重启即丢失
    Memory,
}

/// 缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// sled 目录或 SQLite 文件路径
    #[serde(default = "default_cache_path")]
    pub path: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// 条目有效期（秒）
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// 启动后首次清理的延迟（秒）
    #[serde(default = "default_eviction_startup_delay")]
    pub eviction_startup_delay_secs: u64,

    /// 周期清理间隔（秒）
    #[serde(default = "default_eviction_interval")]
    pub eviction_interval_secs: u64,
}

fn default_cache_path() -> String {
    "data/cache.sled".to_string()
}

fn default_namespace() -> String {
    "storyvoice-tts".to_string()
}

fn default_schema_version() -> u32 {
    1
}

fn default_ttl_secs() -> u64 {
    7 * 24 * 3600 // 7 天
}

fn default_eviction_startup_delay() -> u64 {
    5
}

fn default_eviction_interval() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: default_cache_path(),
            namespace: default_namespace(),
            schema_version: default_schema_version(),
            ttl_secs: default_ttl_secs(),
            eviction_startup_delay_secs: default_eviction_startup_delay(),
            eviction_interval_secs: default_eviction_interval(),
        }
    }
}

impl CacheConfig {
    /// SQLite 连接 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }

    pub fn ttl(&self) -> chrono::Duration {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 更新循环间隔（毫秒）
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// 默认 locale
    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default)]
    pub segmenter: SegmenterMode,

    /// 空闲会话过期时间（秒）
    #[serde(default = "default_session_expire")]
    pub session_expire_secs: u64,
}

fn default_tick_ms() -> u64 {
    16
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_session_expire() -> u64 {
    1800
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            locale: default_locale(),
            segmenter: SegmenterMode::default(),
            session_expire_secs: default_session_expire(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "0.0.0.0:5070");
        assert_eq!(config.tts.provider, TtsProvider::Http);
        assert_eq!(config.tts.timeout(), Duration::from_secs(15));
        assert_eq!(config.tts.output_format().content_type(), "audio/mpeg");
        assert_eq!(config.cache.backend, CacheBackend::Sled);
        assert_eq!(config.cache.ttl(), chrono::Duration::days(7));
        assert_eq!(config.playback.segmenter, SegmenterMode::Auto);
    }

    #[test]
    fn test_database_url() {
        let config = CacheConfig {
            path: "data/storyvoice.db".to_string(),
            ..CacheConfig::default()
        };
        assert_eq!(config.database_url(), "sqlite:data/storyvoice.db?mode=rwc");
    }

    #[test]
    fn test_enums_deserialize_snake_case() {
        let provider: TtsProvider = serde_json::from_str("\"fake\"").unwrap();
        assert_eq!(provider, TtsProvider::Fake);
        let backend: CacheBackend = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(backend, CacheBackend::Memory);
    }
}
