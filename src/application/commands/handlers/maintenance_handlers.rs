//! Maintenance Command Handlers

use std::sync::Arc;

use crate::application::cache::TtlCache;
use crate::application::commands::maintenance_commands::*;
use crate::application::credentials::CredentialResolver;
use crate::application::error::ApplicationError;
use crate::domain::speech::AudioEntry;

/// SetCredential Handler - 替换存储的 API key
pub struct SetCredentialHandler {
    credentials: Arc<CredentialResolver>,
}

impl SetCredentialHandler {
    pub fn new(credentials: Arc<CredentialResolver>) -> Self {
        Self { credentials }
    }

    pub async fn handle(&self, cmd: SetCredentialCommand) -> Result<(), ApplicationError> {
        self.credentials.replace(&cmd.api_key).await?;
        Ok(())
    }
}

/// EvictCache Handler - 手动触发一次过期扫描
pub struct EvictCacheHandler {
    cache: Arc<TtlCache<AudioEntry>>,
}

impl EvictCacheHandler {
    pub fn new(cache: Arc<TtlCache<AudioEntry>>) -> Self {
        Self { cache }
    }

    pub async fn handle(&self, _cmd: EvictCacheCommand) -> Result<EvictCacheResponse, ApplicationError> {
        let evicted = self.cache.evict_expired().await;
        Ok(EvictCacheResponse { evicted })
    }
}
