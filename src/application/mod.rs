//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（KV 存储、TtsEngine、AudioOutput、SessionManager 等）
//! - cache: 基于 KV 存储的 TTL 缓存
//! - credentials / synthesizer: API 凭据解析与语音合成
//! - playback: 播放控制器与输出绑定
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod cache;
pub mod commands;
pub mod credentials;
pub mod error;
pub mod playback;
pub mod ports;
pub mod queries;
pub mod synthesizer;

// Re-exports
pub use cache::{cache_key, CacheEntry, CacheStats, TtlCache, TtlCacheConfig};
pub use credentials::CredentialResolver;
pub use synthesizer::{SpeechSynthesizer, SynthesizerSettings};

pub use playback::{
    AudioBinding, BindingTicket, PlaybackController, PlaybackSettings, PlaybackStatus,
    SessionWords,
};

pub use commands::{
    // Playback commands
    CloseSessionCommand,
    CloseSessionResponse,
    CreateSessionCommand,
    CreateSessionResponse,
    PlaybackAction,
    PlaybackCommand,
    ReportPlaybackErrorCommand,
    SeekCommand,
    SeekPhase,
    // Maintenance commands
    EvictCacheCommand,
    EvictCacheResponse,
    SetCredentialCommand,
    // Handlers
    handlers::{
        CloseSessionHandler, CreateSessionHandler, EvictCacheHandler, PlaybackHandler,
        ReportPlaybackErrorHandler, SeekHandler, SetCredentialHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    AudioOutputPort, CredentialError, CredentialPromptPort, CredentialStorePort, KeyValueStorePort,
    KvError, PlaybackEventPort, SessionError, SessionManagerPort, SynthesisRequest, TtsEnginePort,
    TtsError,
};

pub use queries::{
    // Session queries
    GetAudioQuery,
    GetAudioResponse,
    GetSessionStatusQuery,
    GetSessionWordsQuery,
    // Maintenance queries
    CredentialStatusResponse,
    GetCacheStatsQuery,
    GetCredentialStatusQuery,
    // Handlers
    handlers::{
        GetAudioHandler, GetCacheStatsHandler, GetCredentialStatusHandler,
        GetSessionStatusHandler, GetSessionWordsHandler,
    },
};
