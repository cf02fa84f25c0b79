//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod kv_store;

pub use database::*;
pub use kv_store::*;
