//! KV Credential Store - 把 API key 存在 KV 存储的独立 key 下
//!
//! key 不带缓存命名空间前缀，过期扫描不会触及

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::ports::{CredentialError, CredentialStorePort, KeyValueStorePort};

pub const DEFAULT_CREDENTIAL_KEY: &str = "credential:tts_api_key";

pub struct KvCredentialStore {
    store: Arc<dyn KeyValueStorePort>,
    key: String,
}

impl KvCredentialStore {
    pub fn new(store: Arc<dyn KeyValueStorePort>) -> Self {
        Self::with_key(store, DEFAULT_CREDENTIAL_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStorePort>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

#[async_trait]
impl CredentialStorePort for KvCredentialStore {
    async fn get(&self) -> Result<Option<String>, CredentialError> {
        let bytes = self
            .store
            .get(&self.key)
            .await
            .map_err(|e| CredentialError::StorageError(e.to_string()))?;

        match bytes {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| CredentialError::Invalid(e.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, value: &str) -> Result<(), CredentialError> {
        self.store
            .set(&self.key, value.as_bytes().to_vec())
            .await
            .map_err(|e| CredentialError::StorageError(e.to_string()))
    }
}
