//! Maintenance Query Handlers

use std::sync::Arc;

use crate::application::cache::{CacheStats, TtlCache};
use crate::application::credentials::CredentialResolver;
use crate::application::error::ApplicationError;
use crate::application::queries::maintenance_queries::*;
use crate::domain::speech::AudioEntry;

/// GetCacheStats Handler
pub struct GetCacheStatsHandler {
    cache: Arc<TtlCache<AudioEntry>>,
}

impl GetCacheStatsHandler {
    pub fn new(cache: Arc<TtlCache<AudioEntry>>) -> Self {
        Self { cache }
    }

    pub async fn handle(&self, _query: GetCacheStatsQuery) -> Result<CacheStats, ApplicationError> {
        Ok(self.cache.stats())
    }
}

/// GetCredentialStatus Handler
pub struct GetCredentialStatusHandler {
    credentials: Arc<CredentialResolver>,
}

impl GetCredentialStatusHandler {
    pub fn new(credentials: Arc<CredentialResolver>) -> Self {
        Self { credentials }
    }

    pub async fn handle(
        &self,
        _query: GetCredentialStatusQuery,
    ) -> Result<CredentialStatusResponse, ApplicationError> {
        Ok(CredentialStatusResponse {
            configured: self.credentials.is_configured().await,
        })
    }
}
