//! API 凭据解析
//!
//! 先读存储；缺失时向 [`CredentialPromptPort`] 征询一次并写回存储。

use std::sync::Arc;

use crate::application::ports::{CredentialError, CredentialPromptPort, CredentialStorePort};

pub struct CredentialResolver {
    store: Arc<dyn CredentialStorePort>,
    prompt: Arc<dyn CredentialPromptPort>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn CredentialStorePort>, prompt: Arc<dyn CredentialPromptPort>) -> Self {
        Self { store, prompt }
    }

    /// 获取 API key，拿不到时返回 `None`
    pub async fn resolve(&self) -> Option<String> {
        match self.store.get().await {
            Ok(Some(key)) if !key.trim().is_empty() => return Some(key),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored credential");
            }
        }

        let key = match self.prompt.solicit().await {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => {
                tracing::warn!("No API key available, synthesis skipped");
                return None;
            }
        };

        // 写回失败不影响本次使用
        if let Err(e) = self.store.set(&key).await {
            tracing::warn!(error = %e, "Failed to persist credential");
        } else {
            tracing::info!("API key stored");
        }

        Some(key)
    }

    /// 直接替换已存储的 API key
    pub async fn replace(&self, key: &str) -> Result<(), CredentialError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CredentialError::Invalid("API key must not be empty".to_string()));
        }
        self.store.set(key).await?;
        tracing::info!("API key replaced");
        Ok(())
    }

    /// 存储中是否已有 API key（不会触发征询）
    pub async fn is_configured(&self) -> bool {
        matches!(self.store.get().await, Ok(Some(key)) if !key.trim().is_empty())
    }
}
