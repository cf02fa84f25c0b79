//! Credential Adapters - API key 的存储与征询

mod configured_prompt;
mod kv_credential_store;

pub use configured_prompt::ConfiguredCredentialPrompt;
pub use kv_credential_store::{KvCredentialStore, DEFAULT_CREDENTIAL_KEY};
