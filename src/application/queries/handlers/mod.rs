//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod maintenance_handlers;
mod session_handlers;

pub use maintenance_handlers::*;
pub use session_handlers::*;
