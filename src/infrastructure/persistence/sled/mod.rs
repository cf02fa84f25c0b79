//! Sled 存储实现

mod kv_store;

pub use kv_store::{SledKeyValueStore, SledStoreConfig};
