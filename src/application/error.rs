//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{CredentialError, SessionError};
use crate::domain::playback::PlaybackError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 播放错误
    #[error("Playback error: {0}")]
    PlaybackError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<SessionError> for ApplicationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => Self::not_found("Session", id),
            SessionError::AlreadyExists(id) => {
                Self::InvalidState(format!("Session already exists: {}", id))
            }
        }
    }
}

impl From<PlaybackError> for ApplicationError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::InvalidTransition { .. } | PlaybackError::NoAudio => {
                Self::InvalidState(err.to_string())
            }
            PlaybackError::SynthesisFailed(_) => Self::ExternalServiceError(err.to_string()),
            PlaybackError::DecodeFailed(_) | PlaybackError::OutputFailed(_) => {
                Self::PlaybackError(err.to_string())
            }
        }
    }
}

impl From<CredentialError> for ApplicationError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Invalid(msg) => Self::ValidationError(msg),
            CredentialError::StorageError(msg) => Self::StorageError(msg),
        }
    }
}
