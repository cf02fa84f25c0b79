//! Credential Ports - API 凭据的存取与征询

use async_trait::async_trait;
use thiserror::Error;

/// 凭据存储错误
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential storage error: {0}")]
    StorageError(String),

    #[error("Invalid credential: {0}")]
    Invalid(String),
}

/// Credential Store Port
///
/// 读写单个具名字符串值（API key），跨会话持久化
#[async_trait]
pub trait CredentialStorePort: Send + Sync {
    async fn get(&self) -> Result<Option<String>, CredentialError>;

    async fn set(&self, value: &str) -> Result<(), CredentialError>;
}

/// Credential Prompt Port
///
/// 凭据缺失时向用户（或运行环境）征询一次；拒绝提供时返回 `None`
#[async_trait]
pub trait CredentialPromptPort: Send + Sync {
    async fn solicit(&self) -> Option<String>;
}
