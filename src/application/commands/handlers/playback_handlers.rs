//! Playback Command Handlers

use std::sync::Arc;

use crate::application::commands::playback_commands::*;
use crate::application::error::ApplicationError;
use crate::application::playback::{PlaybackController, PlaybackStatus};

/// CreateSession Handler - 创建会话并分词
pub struct CreateSessionHandler {
    controller: Arc<PlaybackController>,
}

impl CreateSessionHandler {
    pub fn new(controller: Arc<PlaybackController>) -> Self {
        Self { controller }
    }

    pub async fn handle(
        &self,
        cmd: CreateSessionCommand,
    ) -> Result<CreateSessionResponse, ApplicationError> {
        let session_id = self
            .controller
            .create_session(&cmd.text, cmd.locale.as_deref())?;
        let word_count = self.controller.status(&session_id)?.word_count;

        Ok(CreateSessionResponse {
            session_id,
            word_count,
        })
    }
}

/// Playback Handler - play / pause / resume / stop
pub struct PlaybackHandler {
    controller: Arc<PlaybackController>,
}

impl PlaybackHandler {
    pub fn new(controller: Arc<PlaybackController>) -> Self {
        Self { controller }
    }

    pub async fn handle(&self, cmd: PlaybackCommand) -> Result<PlaybackStatus, ApplicationError> {
        tracing::debug!(session_id = %cmd.session_id, action = ?cmd.action, "Playback command");

        match cmd.action {
            PlaybackAction::Play => self.controller.start(&cmd.session_id).await,
            PlaybackAction::Pause => self.controller.pause(&cmd.session_id).await,
            PlaybackAction::Resume => self.controller.resume(&cmd.session_id).await,
            PlaybackAction::Stop => self.controller.stop(&cmd.session_id).await,
        }
    }
}

/// Seek Handler - 拖动进度的三个阶段
pub struct SeekHandler {
    controller: Arc<PlaybackController>,
}

impl SeekHandler {
    pub fn new(controller: Arc<PlaybackController>) -> Self {
        Self { controller }
    }

    pub async fn handle(&self, cmd: SeekCommand) -> Result<PlaybackStatus, ApplicationError> {
        match cmd.phase {
            SeekPhase::Begin => self.controller.begin_seek(&cmd.session_id).await,
            SeekPhase::Preview => {
                let target = Self::target(cmd.position)?;
                self.controller.preview_seek(&cmd.session_id, target).await
            }
            SeekPhase::Commit => {
                let target = Self::target(cmd.position)?;
                self.controller.commit_seek(&cmd.session_id, target).await
            }
        }
    }

    fn target(position: Option<f64>) -> Result<f64, ApplicationError> {
        match position {
            Some(p) if p.is_finite() => Ok(p),
            Some(_) => Err(ApplicationError::validation("position must be finite")),
            None => Err(ApplicationError::validation(
                "position is required for preview and commit",
            )),
        }
    }
}

/// ReportPlaybackError Handler
pub struct ReportPlaybackErrorHandler {
    controller: Arc<PlaybackController>,
}

impl ReportPlaybackErrorHandler {
    pub fn new(controller: Arc<PlaybackController>) -> Self {
        Self { controller }
    }

    pub async fn handle(
        &self,
        cmd: ReportPlaybackErrorCommand,
    ) -> Result<PlaybackStatus, ApplicationError> {
        let reason = cmd.reason.trim();
        if reason.is_empty() {
            return Err(ApplicationError::validation("reason must not be empty"));
        }

        self.controller.report_error(&cmd.session_id, reason).await
    }
}

/// CloseSession Handler
pub struct CloseSessionHandler {
    controller: Arc<PlaybackController>,
}

impl CloseSessionHandler {
    pub fn new(controller: Arc<PlaybackController>) -> Self {
        Self { controller }
    }

    pub async fn handle(
        &self,
        cmd: CloseSessionCommand,
    ) -> Result<CloseSessionResponse, ApplicationError> {
        self.controller
            .close(&cmd.session_id, "closed by client")
            .await?;

        Ok(CloseSessionResponse {
            session_id: cmd.session_id,
        })
    }
}
