//! Sled-based Key-Value Store Implementation

use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{KeyValueStorePort, KvError};

/// Sled 存储配置
#[derive(Debug, Clone)]
pub struct SledStoreConfig {
    /// 数据库路径
    pub db_path: String,
    /// 写入后是否立即刷盘
    pub flush_on_write: bool,
}

impl Default for SledStoreConfig {
    fn default() -> Self {
        Self {
            db_path: "data/cache.sled".to_string(),
            flush_on_write: false,
        }
    }
}

/// Sled KV 存储
pub struct SledKeyValueStore {
    db: Db,
    flush_on_write: bool,
}

impl SledKeyValueStore {
    /// 创建新的存储实例
    pub fn new(config: &SledStoreConfig) -> Result<Self, KvError> {
        let db = sled::open(&config.db_path).map_err(|e| KvError::DatabaseError(e.to_string()))?;

        tracing::info!(
            db_path = %config.db_path,
            entries = db.len(),
            "SledKeyValueStore initialized"
        );

        Ok(Self {
            db,
            flush_on_write: config.flush_on_write,
        })
    }

    /// 打开现有存储
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KvError> {
        let config = SledStoreConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        };
        Self::new(&config)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 刷新数据库
    pub fn flush(&self) -> Result<(), KvError> {
        self.db
            .flush()
            .map_err(|e| KvError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorePort for SledKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        self.db
            .get(key)
            .map(|v| v.map(|ivec| ivec.to_vec()))
            .map_err(|e| KvError::DatabaseError(e.to_string()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), KvError> {
        self.db
            .insert(key, value)
            .map_err(|e| KvError::DatabaseError(e.to_string()))?;

        if self.flush_on_write {
            self.db
                .flush_async()
                .await
                .map_err(|e| KvError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, KvError> {
        let mut keys = Vec::new();
        for item in self.db.iter().keys() {
            let key = item.map_err(|e| KvError::DatabaseError(e.to_string()))?;
            match String::from_utf8(key.to_vec()) {
                Ok(key) => keys.push(key),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping non UTF-8 key");
                }
            }
        }
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.db
            .remove(key)
            .map_err(|e| KvError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
