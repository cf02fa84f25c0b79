//! Worker Layer - Background Task Processing
//!
//! 实现 MaintenanceWorker，定期淘汰过期缓存并清理空闲会话

mod maintenance_worker;

pub use maintenance_worker::{MaintenanceWorker, MaintenanceWorkerConfig};
