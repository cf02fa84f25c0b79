//! Persistence Layer - 数据持久化
//!
//! Sled 和 SQLite 的 KV 存储实现

pub mod sled;
pub mod sqlite;

pub use self::sled::{SledKeyValueStore, SledStoreConfig};
pub use self::sqlite::SqliteKeyValueStore;
