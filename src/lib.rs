//! StoryVoice - 带单词高亮的朗读播放服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Playback Context: 播放会话状态机与事件
//! - Speech Context: 合成结果、字符对齐与单词时间表
//! - Text Segmenter: 单词切分
//!
//! 应用层 (application/):
//! - Ports: KV 存储、TtsEngine、AudioOutput、SessionManager、凭据、事件
//! - Cache / Synthesizer: TTL 缓存与语音合成
//! - Playback: 播放控制器与输出绑定
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: SessionManager 与 KV 内存实现
//! - Persistence: Sled / SQLite KV 存储
//! - Adapters: TTS 客户端、音频输出、凭据
//! - Worker: 缓存淘汰与空闲会话清理
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
