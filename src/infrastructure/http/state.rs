//! Application State
//!
//! HTTP 层共享状态：Command/Query Handlers 与事件发布器

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CloseSessionHandler, CreateSessionHandler, EvictCacheHandler, PlaybackHandler,
    ReportPlaybackErrorHandler, SeekHandler, SetCredentialHandler,
    // Query handlers
    GetAudioHandler, GetCacheStatsHandler, GetCredentialStatusHandler, GetSessionStatusHandler,
    GetSessionWordsHandler,
    // Services
    CredentialResolver, PlaybackController, SessionManagerPort, TtlCache,
};
use crate::domain::speech::AudioEntry;
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    // ========== Services ==========
    pub controller: Arc<PlaybackController>,
    pub session_manager: Arc<dyn SessionManagerPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub create_session_handler: CreateSessionHandler,
    pub playback_handler: PlaybackHandler,
    pub seek_handler: SeekHandler,
    pub report_error_handler: ReportPlaybackErrorHandler,
    pub close_session_handler: CloseSessionHandler,
    pub set_credential_handler: SetCredentialHandler,
    pub evict_cache_handler: EvictCacheHandler,

    // ========== Query Handlers ==========
    pub get_session_status_handler: GetSessionStatusHandler,
    pub get_session_words_handler: GetSessionWordsHandler,
    pub get_audio_handler: GetAudioHandler,
    pub get_cache_stats_handler: GetCacheStatsHandler,
    pub get_credential_status_handler: GetCredentialStatusHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        controller: Arc<PlaybackController>,
        session_manager: Arc<dyn SessionManagerPort>,
        cache: Arc<TtlCache<AudioEntry>>,
        credentials: Arc<CredentialResolver>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            controller: controller.clone(),
            session_manager,
            event_publisher,

            create_session_handler: CreateSessionHandler::new(controller.clone()),
            playback_handler: PlaybackHandler::new(controller.clone()),
            seek_handler: SeekHandler::new(controller.clone()),
            report_error_handler: ReportPlaybackErrorHandler::new(controller.clone()),
            close_session_handler: CloseSessionHandler::new(controller.clone()),
            set_credential_handler: SetCredentialHandler::new(credentials.clone()),
            evict_cache_handler: EvictCacheHandler::new(cache.clone()),

            get_session_status_handler: GetSessionStatusHandler::new(controller.clone()),
            get_session_words_handler: GetSessionWordsHandler::new(controller.clone()),
            get_audio_handler: GetAudioHandler::new(controller),
            get_cache_stats_handler: GetCacheStatsHandler::new(cache),
            get_credential_status_handler: GetCredentialStatusHandler::new(credentials),
        }
    }
}
