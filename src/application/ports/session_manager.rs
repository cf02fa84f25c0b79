//! Session Manager Port - 播放会话生命周期管理
//!
//! 定义会话管理的抽象接口，具体实现在 infrastructure/memory 层

use thiserror::Error;

use crate::domain::playback::PlayerSession;

/// Session Manager 错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session already exists: {0}")]
    AlreadyExists(String),
}

/// Session Manager Port
///
/// 管理播放会话的生命周期，所有状态存储在内存中
pub trait SessionManagerPort: Send + Sync {
    /// 创建新会话
    fn create(&self, session: PlayerSession) -> Result<String, SessionError>;

    /// 获取会话快照
    fn get(&self, id: &str) -> Result<PlayerSession, SessionError>;

    /// 原地修改会话
    fn update(
        &self,
        id: &str,
        f: &mut dyn FnMut(&mut PlayerSession),
    ) -> Result<(), SessionError>;

    /// 检查会话是否有效
    fn is_valid(&self, id: &str) -> bool;

    /// 关闭会话
    fn close(&self, id: &str) -> Result<(), SessionError>;

    /// 更新最后活动时间
    fn touch(&self, id: &str);

    /// 获取所有过期会话的 ID
    fn get_expired_sessions(&self, idle_timeout_secs: u64) -> Vec<String>;

    /// 获取所有会话 ID
    fn list_all(&self) -> Vec<String>;
}
