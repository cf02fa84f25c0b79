//! Key-Value Store Port - 异步键值存储抽象
//!
//! 缓存策略（TTL、淘汰）与存储介质解耦：sled、SQLite、内存实现共用同一接口

use async_trait::async_trait;
use thiserror::Error;

/// KV 存储错误
#[derive(Debug, Error)]
pub enum KvError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Key-Value Store Port
#[async_trait]
pub trait KeyValueStorePort: Send + Sync {
    /// 读取 key 对应的值
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// 写入（覆盖）key 对应的值
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), KvError>;

    /// 列出所有 key
    async fn keys(&self) -> Result<Vec<String>, KvError>;

    /// 删除 key（不存在时不报错）
    async fn delete(&self, key: &str) -> Result<(), KvError>;
}
