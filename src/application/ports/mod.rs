//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_output;
mod credential_store;
mod event_publisher;
mod key_value_store;
mod session_manager;
mod tts_engine;

pub use audio_output::AudioOutputPort;
pub use credential_store::{CredentialError, CredentialPromptPort, CredentialStorePort};
pub use event_publisher::PlaybackEventPort;
pub use key_value_store::{KeyValueStorePort, KvError};
pub use session_manager::{SessionError, SessionManagerPort};
pub use tts_engine::{SynthesisRequest, TtsEnginePort, TtsError};
