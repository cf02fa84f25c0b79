//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod maintenance_commands;
mod playback_commands;

pub mod handlers;

pub use maintenance_commands::*;
pub use playback_commands::*;
