//! Memory Layer - In-Memory State Management
//!
//! 实现 SessionManager 和内存 KV 存储

mod kv_store;
mod session_manager;

pub use kv_store::InMemoryKeyValueStore;
pub use session_manager::InMemorySessionManager;
