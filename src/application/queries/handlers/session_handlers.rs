//! Session Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::playback::{PlaybackController, PlaybackStatus, SessionWords};
use crate::application::queries::session_queries::*;

/// GetSessionStatus Handler
pub struct GetSessionStatusHandler {
    controller: Arc<PlaybackController>,
}

impl GetSessionStatusHandler {
    pub fn new(controller: Arc<PlaybackController>) -> Self {
        Self { controller }
    }

    pub async fn handle(
        &self,
        query: GetSessionStatusQuery,
    ) -> Result<PlaybackStatus, ApplicationError> {
        self.controller.status(&query.session_id)
    }
}

/// GetSessionWords Handler
pub struct GetSessionWordsHandler {
    controller: Arc<PlaybackController>,
}

impl GetSessionWordsHandler {
    pub fn new(controller: Arc<PlaybackController>) -> Self {
        Self { controller }
    }

    pub async fn handle(&self, query: GetSessionWordsQuery) -> Result<SessionWords, ApplicationError> {
        self.controller.words(&query.session_id)
    }
}

/// GetAudio Handler - 会话当前持有的音频数据
pub struct GetAudioHandler {
    controller: Arc<PlaybackController>,
}

impl GetAudioHandler {
    pub fn new(controller: Arc<PlaybackController>) -> Self {
        Self { controller }
    }

    pub async fn handle(&self, query: GetAudioQuery) -> Result<GetAudioResponse, ApplicationError> {
        let entry = self.controller.audio(&query.session_id)?;
        Ok(GetAudioResponse { entry })
    }
}
