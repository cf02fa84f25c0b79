//! Playback Controller - 播放会话编排
//!
//! - 所有操作由一把异步锁串行化；网络请求在锁外进行
//! - 输出同一时刻只绑定一个会话，切换会话会停止并释放前一个
//! - 更新循环按 `tick_interval` 读取输出位置，发布进度与高亮事件；
//!   每次 tick 校验绑定票据，过期的循环自行退出

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::binding::{AudioBinding, BindingTicket};
use crate::application::error::ApplicationError;
use crate::application::ports::{AudioOutputPort, PlaybackEventPort, SessionManagerPort};
use crate::application::synthesizer::SpeechSynthesizer;
use crate::domain::playback::{AudioHandle, PlaybackEvent, PlaybackState, PlayerSession};
use crate::domain::speech::{AudioEntry, WordTiming};
use crate::domain::text_segmenter::{WordSegmenter, WordSpan};

/// 播放参数（来自 `[playback]` 配置段）
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    /// 更新循环间隔
    pub tick_interval: Duration,
    /// 创建会话未指定 locale 时使用
    pub default_locale: String,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            default_locale: "en".to_string(),
        }
    }
}

/// 会话状态快照
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackStatus {
    pub session_id: String,
    pub state: PlaybackState,
    pub position: f64,
    pub duration: Option<f64>,
    pub is_seeking: bool,
    pub seek_preview: Option<f64>,
    pub highlight_index: Option<usize>,
    pub word_count: usize,
    pub has_alignment: bool,
    pub is_bound: bool,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 会话的分词与时间表
#[derive(Debug, Clone, Serialize)]
pub struct SessionWords {
    pub session_id: String,
    pub words: Vec<WordSpan>,
    pub timings: Option<Vec<WordTiming>>,
}

pub struct PlaybackController {
    sessions: Arc<dyn SessionManagerPort>,
    output: Arc<dyn AudioOutputPort>,
    synthesizer: Arc<SpeechSynthesizer>,
    segmenter: Arc<dyn WordSegmenter>,
    events: Arc<dyn PlaybackEventPort>,
    binding: AudioBinding,
    op_lock: tokio::sync::Mutex<()>,
    loop_token: Mutex<Option<CancellationToken>>,
    /// 锁外合成中的绑定；进入 loading 之前也能挡住重复的 start
    synthesizing: Mutex<Option<BindingTicket>>,
    settings: PlaybackSettings,
}

impl PlaybackController {
    pub fn new(
        sessions: Arc<dyn SessionManagerPort>,
        output: Arc<dyn AudioOutputPort>,
        synthesizer: Arc<SpeechSynthesizer>,
        segmenter: Arc<dyn WordSegmenter>,
        events: Arc<dyn PlaybackEventPort>,
        settings: PlaybackSettings,
    ) -> Self {
        tracing::info!(
            segmenter = segmenter.name(),
            tick_ms = settings.tick_interval.as_millis() as u64,
            "PlaybackController initialized"
        );

        Self {
            sessions,
            output,
            synthesizer,
            segmenter,
            events,
            binding: AudioBinding::new(),
            op_lock: tokio::sync::Mutex::new(()),
            loop_token: Mutex::new(None),
            synthesizing: Mutex::new(None),
            settings,
        }
    }

    /// 创建播放会话，文本在此时分词
    pub fn create_session(
        &self,
        text: &str,
        locale: Option<&str>,
    ) -> Result<String, ApplicationError> {
        if text.trim().is_empty() {
            return Err(ApplicationError::validation("text must not be empty"));
        }
        let locale = locale
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.settings.default_locale);

        let mut session = PlayerSession::new(text, locale);
        let word_count = session.ensure_segmented(self.segmenter.as_ref()).len();
        let session_id = self.sessions.create(session)?;

        tracing::info!(
            session_id = %session_id,
            locale = %locale,
            word_count = word_count,
            text_chars = text.chars().count(),
            "Player session created"
        );
        Ok(session_id)
    }

    /// 开始播放
    ///
    /// - 已持有音频：从 `last_known_position` 继续
    /// - 缓存命中：直接挂载播放，不经过 loading
    /// - 否则进入 loading 并发起合成；结果返回时若绑定已变更则丢弃
    pub async fn start(self: &Arc<Self>, session_id: &str) -> Result<PlaybackStatus, ApplicationError> {
        let guard = self.op_lock.lock().await;
        let session = self.sessions.get(session_id)?;

        if matches!(session.state(), PlaybackState::Playing | PlaybackState::Loading)
            || self.is_synthesizing(session_id)
        {
            return Ok(self.status_of(&session));
        }

        let ticket = self.bind(session_id);

        if let Some(handle) = session.audio_handle().cloned() {
            self.play_handle(&ticket, &handle, session.last_known_position())?;
            return self.snapshot(session_id);
        }

        if let Some(entry) = self.synthesizer.lookup(session.text()).await {
            tracing::debug!(session_id = %session_id, "Playing from cache");
            self.attach_and_play(&ticket, entry)?;
            return self.snapshot(session_id);
        }

        let mark = self.mark_synthesizing(&ticket);
        drop(guard);

        let entry = {
            let this = Arc::clone(self);
            let ticket = ticket.clone();
            self.synthesizer
                .synthesize(session.text(), move || this.enter_loading(&ticket))
                .await
        };

        let _guard = self.op_lock.lock().await;
        drop(mark);

        if !self.binding.is_current(&ticket) {
            tracing::info!(
                session_id = %session_id,
                generation = ticket.generation(),
                "Binding changed during synthesis, result discarded"
            );
            self.settle_stale_loading(session_id);
            return self.snapshot(session_id);
        }

        match entry {
            Some(entry) => self.attach_and_play(&ticket, entry)?,
            None => {
                self.fail_bound(session_id, "speech synthesis failed");
                return Err(ApplicationError::ExternalServiceError(
                    "Speech synthesis failed".to_string(),
                ));
            }
        }

        self.snapshot(session_id)
    }

    pub async fn pause(&self, session_id: &str) -> Result<PlaybackStatus, ApplicationError> {
        let _guard = self.op_lock.lock().await;
        let session = self.sessions.get(session_id)?;

        if session.state() != PlaybackState::Playing {
            return Err(ApplicationError::invalid_state(format!(
                "cannot pause while {}",
                session.state()
            )));
        }

        self.cancel_update_loop();
        self.output.pause();
        let position = self.output.position();
        self.sessions.update(session_id, &mut |s| {
            s.record_position(position);
        })?;
        self.transition(session_id, PlaybackState::Paused)?;

        tracing::debug!(session_id = %session_id, position = position, "Playback paused");
        self.snapshot(session_id)
    }

    pub async fn resume(self: &Arc<Self>, session_id: &str) -> Result<PlaybackStatus, ApplicationError> {
        {
            let _guard = self.op_lock.lock().await;
            let session = self.sessions.get(session_id)?;
            if session.state() != PlaybackState::Paused {
                return Err(ApplicationError::invalid_state(format!(
                    "cannot resume while {}",
                    session.state()
                )));
            }
        }
        self.start(session_id).await
    }

    /// 开始拖动：之后的进度更新不再覆盖显示位置
    pub async fn begin_seek(&self, session_id: &str) -> Result<PlaybackStatus, ApplicationError> {
        let _guard = self.op_lock.lock().await;
        self.sessions.update(session_id, &mut |s| s.begin_seek())?;
        self.snapshot(session_id)
    }

    /// 拖动中：只发布预览位置，不移动输出
    pub async fn preview_seek(
        &self,
        session_id: &str,
        target: f64,
    ) -> Result<PlaybackStatus, ApplicationError> {
        let _guard = self.op_lock.lock().await;
        let mut preview = 0.0;
        let mut duration = 0.0;
        self.sessions.update(session_id, &mut |s| {
            preview = s.preview_seek(target);
            duration = s.audio_handle().map(AudioHandle::duration).unwrap_or(0.0);
        })?;

        self.events.publish(PlaybackEvent::Progress {
            session_id: session_id.to_string(),
            position: preview,
            duration,
            seeking: true,
        });
        self.snapshot(session_id)
    }

    /// 松开拖动：移动输出位置并恢复正常进度更新
    pub async fn commit_seek(
        &self,
        session_id: &str,
        target: f64,
    ) -> Result<PlaybackStatus, ApplicationError> {
        let _guard = self.op_lock.lock().await;
        let mut position = 0.0;
        let mut duration = None;
        let mut highlight = None;
        self.sessions.update(session_id, &mut |s| {
            position = s.commit_seek(target);
            duration = s.audio_handle().map(AudioHandle::duration);
            highlight = s.refresh_highlight(position);
        })?;

        if duration.is_some() && self.binding.is_owner(session_id) {
            self.output.set_position(position);
        }

        tracing::debug!(session_id = %session_id, position = position, "Seek committed");
        self.events.publish(PlaybackEvent::Progress {
            session_id: session_id.to_string(),
            position,
            duration: duration.unwrap_or(0.0),
            seeking: false,
        });
        if let Some(index) = highlight {
            self.events.publish(PlaybackEvent::Highlight {
                session_id: session_id.to_string(),
                index,
            });
        }
        self.snapshot(session_id)
    }

    /// 显式停止：释放输出与音频句柄
    pub async fn stop(&self, session_id: &str) -> Result<PlaybackStatus, ApplicationError> {
        let _guard = self.op_lock.lock().await;
        self.stop_locked(session_id)?;
        self.snapshot(session_id)
    }

    /// 客户端上报音频元素错误
    ///
    /// 错误写入输出，由更新循环的下一次 tick 处理（释放句柄，error 后回到 idle）。
    /// 只有当前绑定输出的会话可以上报。
    pub async fn report_error(
        &self,
        session_id: &str,
        reason: &str,
    ) -> Result<PlaybackStatus, ApplicationError> {
        let _guard = self.op_lock.lock().await;
        let session = self.sessions.get(session_id)?;

        if !self.binding.is_owner(session_id)
            || !matches!(session.state(), PlaybackState::Playing | PlaybackState::Paused)
        {
            return Err(ApplicationError::invalid_state(format!(
                "cannot report playback error while {}",
                session.state()
            )));
        }

        tracing::warn!(session_id = %session_id, reason = %reason, "Playback error reported by client");
        self.output.report_error(reason);

        // 暂停时没有更新循环，直接处理
        if session.state() == PlaybackState::Paused {
            if let Some(reason) = self.output.take_error() {
                self.fail_bound(session_id, &reason);
            }
            return self.snapshot(session_id);
        }
        Ok(self.status_of(&session))
    }

    /// 关闭会话
    pub async fn close(&self, session_id: &str, reason: &str) -> Result<(), ApplicationError> {
        let _guard = self.op_lock.lock().await;
        self.stop_locked(session_id)?;
        self.sessions.close(session_id)?;

        self.events.publish(PlaybackEvent::SessionClosed {
            session_id: session_id.to_string(),
            reason: reason.to_string(),
        });
        self.events.release_session(session_id);
        Ok(())
    }

    /// 关闭空闲超时的会话，返回关闭数量
    pub async fn close_expired(&self, idle_timeout_secs: u64) -> usize {
        let expired = self.sessions.get_expired_sessions(idle_timeout_secs);
        let mut closed = 0;
        for session_id in expired {
            // 正在播放的会话不算空闲
            if self.binding.is_owner(&session_id) {
                self.sessions.touch(&session_id);
                continue;
            }
            match self.close(&session_id, "expired").await {
                Ok(()) => closed += 1,
                Err(e) => tracing::debug!(session_id = %session_id, error = %e, "Expired session already gone"),
            }
        }
        closed
    }

    pub fn status(&self, session_id: &str) -> Result<PlaybackStatus, ApplicationError> {
        self.snapshot(session_id)
    }

    pub fn words(&self, session_id: &str) -> Result<SessionWords, ApplicationError> {
        let session = self.sessions.get(session_id)?;
        Ok(SessionWords {
            session_id: session_id.to_string(),
            words: session.word_spans().map(<[_]>::to_vec).unwrap_or_default(),
            timings: session.word_timings().map(<[_]>::to_vec),
        })
    }

    /// 会话当前持有的音频
    pub fn audio(&self, session_id: &str) -> Result<Arc<AudioEntry>, ApplicationError> {
        let session = self.sessions.get(session_id)?;
        session
            .audio_handle()
            .map(|h| Arc::clone(h.entry()))
            .ok_or_else(|| ApplicationError::not_found("Audio", session_id))
    }

    pub fn bound_session(&self) -> Option<String> {
        self.binding.owner()
    }

    // ------------------------------------------------------------------
    // 以下方法均在 op_lock 内调用
    // ------------------------------------------------------------------

    /// 绑定输出，顶替并停止其他会话
    fn bind(&self, session_id: &str) -> BindingTicket {
        self.cancel_update_loop();
        let (ticket, previous) = self.binding.acquire(session_id);

        if let Some(previous) = previous {
            self.output.release();
            let stopped = self.sessions.update(&previous, &mut |s| s.stop());
            if stopped.is_ok() {
                self.publish_state(&previous, PlaybackState::Idle, None);
            }
            tracing::info!(
                session_id = %session_id,
                previous_session = %previous,
                "Audio output taken over"
            );
        }

        ticket
    }

    fn attach_and_play(
        self: &Arc<Self>,
        ticket: &BindingTicket,
        entry: AudioEntry,
    ) -> Result<(), ApplicationError> {
        let session_id = ticket.session_id();
        let handle = match self.output.decode(Arc::new(entry)) {
            Ok(handle) => handle,
            Err(e) => {
                self.fail_bound(session_id, &e.to_string());
                return Err(e.into());
            }
        };

        self.sessions
            .update(session_id, &mut |s| s.attach(handle.clone()))?;
        self.play_handle(ticket, &handle, 0.0)
    }

    fn play_handle(
        self: &Arc<Self>,
        ticket: &BindingTicket,
        handle: &AudioHandle,
        position: f64,
    ) -> Result<(), ApplicationError> {
        let session_id = ticket.session_id();
        let started = self.output.bind(handle).and_then(|_| {
            self.output.set_position(position);
            self.output.play()
        });
        if let Err(e) = started {
            self.fail_bound(session_id, &e.to_string());
            return Err(e.into());
        }

        self.transition(session_id, PlaybackState::Playing)?;
        self.spawn_update_loop(ticket.clone());

        tracing::info!(
            session_id = %session_id,
            position = position,
            duration = handle.duration(),
            "Playback started"
        );
        Ok(())
    }

    fn stop_locked(&self, session_id: &str) -> Result<(), ApplicationError> {
        // 先确认会话存在
        self.sessions.get(session_id)?;

        if self.binding.release(session_id) {
            self.cancel_update_loop();
            self.output.release();
        }
        self.sessions.update(session_id, &mut |s| s.stop())?;
        self.publish_state(session_id, PlaybackState::Idle, None);

        tracing::debug!(session_id = %session_id, "Playback stopped");
        Ok(())
    }

    /// 失败：释放资源，发布 error 后回到 idle
    fn fail_bound(&self, session_id: &str, reason: &str) {
        if self.binding.release(session_id) {
            self.cancel_update_loop();
            self.output.release();
        }
        let _ = self.sessions.update(session_id, &mut |s| s.fail(reason));

        tracing::warn!(session_id = %session_id, reason = %reason, "Playback failed");
        self.publish_state(session_id, PlaybackState::Error, Some(reason));
        self.publish_state(session_id, PlaybackState::Idle, None);
    }

    /// 自然播放结束：归零回到 idle，保留音频句柄
    fn finish_bound(&self, session_id: &str) {
        self.cancel_update_loop();
        self.output.pause();
        self.output.set_position(0.0);
        self.binding.release(session_id);

        let mut cleared_highlight = false;
        let mut duration = 0.0;
        let mut result = Ok(());
        let updated = self.sessions.update(session_id, &mut |s| {
            cleared_highlight = s.current_highlight_index().is_some();
            duration = s.audio_handle().map(AudioHandle::duration).unwrap_or(0.0);
            result = s.finish();
        });
        if updated.is_err() {
            return;
        }
        if let Err(e) = result {
            tracing::warn!(session_id = %session_id, error = %e, "Unexpected state at end of playback");
        }

        tracing::info!(session_id = %session_id, "Playback ended");
        self.events.publish(PlaybackEvent::Progress {
            session_id: session_id.to_string(),
            position: 0.0,
            duration,
            seeking: false,
        });
        if cleared_highlight {
            self.events.publish(PlaybackEvent::Highlight {
                session_id: session_id.to_string(),
                index: None,
            });
        }
        self.publish_state(session_id, PlaybackState::Idle, None);
    }

    /// 合成结果过期时，把仍停在 loading 的会话拉回 idle
    fn settle_stale_loading(&self, session_id: &str) {
        let mut settled = false;
        let _ = self.sessions.update(session_id, &mut |s| {
            if s.state() == PlaybackState::Loading {
                s.stop();
                settled = true;
            }
        });
        if settled {
            self.publish_state(session_id, PlaybackState::Idle, None);
        }
    }

    /// 合成请求发出前的回调（锁外调用）
    fn enter_loading(&self, ticket: &BindingTicket) {
        if !self.binding.is_current(ticket) {
            return;
        }
        if self.transition(ticket.session_id(), PlaybackState::Loading).is_ok() {
            tracing::debug!(session_id = %ticket.session_id(), "Loading speech");
        }
    }

    fn transition(&self, session_id: &str, next: PlaybackState) -> Result<(), ApplicationError> {
        let mut result = Ok(());
        self.sessions
            .update(session_id, &mut |s| result = s.transition(next))?;
        result?;
        self.publish_state(session_id, next, None);
        Ok(())
    }

    fn publish_state(&self, session_id: &str, state: PlaybackState, error: Option<&str>) {
        self.events.publish(PlaybackEvent::StateChanged {
            session_id: session_id.to_string(),
            state: state.as_str().to_string(),
            error: error.map(str::to_string),
        });
    }

    fn snapshot(&self, session_id: &str) -> Result<PlaybackStatus, ApplicationError> {
        let session = self.sessions.get(session_id)?;
        Ok(self.status_of(&session))
    }

    fn status_of(&self, session: &PlayerSession) -> PlaybackStatus {
        PlaybackStatus {
            session_id: session.id().to_string(),
            state: session.state(),
            position: session.last_known_position(),
            duration: session.audio_handle().map(AudioHandle::duration),
            is_seeking: session.is_seeking(),
            seek_preview: session.seek_preview(),
            highlight_index: session.current_highlight_index(),
            word_count: session.word_spans().map(<[_]>::len).unwrap_or(0),
            has_alignment: session.word_timings().is_some(),
            is_bound: self.binding.is_owner(session.id()),
            last_error: session.last_error().map(str::to_string),
            created_at: session.created_at(),
        }
    }

    fn is_synthesizing(&self, session_id: &str) -> bool {
        self.synthesizing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| t.session_id() == session_id && self.binding.is_current(t))
    }

    fn mark_synthesizing(&self, ticket: &BindingTicket) -> SynthesisMark<'_> {
        *self.synthesizing.lock().unwrap_or_else(PoisonError::into_inner) = Some(ticket.clone());
        SynthesisMark {
            slot: &self.synthesizing,
            ticket: ticket.clone(),
        }
    }

    // ------------------------------------------------------------------
    // 更新循环
    // ------------------------------------------------------------------

    fn spawn_update_loop(self: &Arc<Self>, ticket: BindingTicket) {
        let token = CancellationToken::new();
        let previous = self
            .loop_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_update_loop(ticket, token).await;
        });
    }

    fn cancel_update_loop(&self) {
        let token = self
            .loop_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            token.cancel();
        }
    }

    async fn run_update_loop(self: Arc<Self>, ticket: BindingTicket, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.settings.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!(
            session_id = %ticket.session_id(),
            generation = ticket.generation(),
            "Update loop started"
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }

            let _guard = self.op_lock.lock().await;
            if token.is_cancelled() || !self.binding.is_current(&ticket) {
                break;
            }
            if !self.tick(&ticket) {
                break;
            }
        }

        tracing::debug!(
            session_id = %ticket.session_id(),
            generation = ticket.generation(),
            "Update loop stopped"
        );
    }

    /// 单次 tick；返回 false 表示循环应结束
    fn tick(&self, ticket: &BindingTicket) -> bool {
        let session_id = ticket.session_id();

        if let Some(reason) = self.output.take_error() {
            self.fail_bound(session_id, &reason);
            return false;
        }
        if self.output.is_ended() {
            self.finish_bound(session_id);
            return false;
        }

        let position = self.output.position();
        let mut recorded = false;
        let mut highlight = None;
        let mut duration = 0.0;
        let updated = self.sessions.update(session_id, &mut |s| {
            recorded = s.record_position(position);
            if recorded {
                highlight = s.refresh_highlight(position);
            }
            duration = s.audio_handle().map(AudioHandle::duration).unwrap_or(0.0);
        });
        if updated.is_err() {
            return false;
        }

        if recorded {
            self.events.publish(PlaybackEvent::Progress {
                session_id: session_id.to_string(),
                position,
                duration,
                seeking: false,
            });
        }
        if let Some(index) = highlight {
            self.events.publish(PlaybackEvent::Highlight {
                session_id: session_id.to_string(),
                index,
            });
        }
        true
    }
}

/// 合成登记；离开作用域时清除（请求被取消也一样）
struct SynthesisMark<'a> {
    slot: &'a Mutex<Option<BindingTicket>>,
    ticket: BindingTicket,
}

impl Drop for SynthesisMark<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        // 其他会话发起的合成不受影响
        if slot.as_ref() == Some(&self.ticket) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cache::{TtlCache, TtlCacheConfig};
    use crate::application::credentials::CredentialResolver;
    use crate::application::ports::{
        CredentialError, CredentialPromptPort, CredentialStorePort, SynthesisRequest,
        TtsEnginePort, TtsError,
    };
    use crate::application::synthesizer::SynthesizerSettings;
    use crate::domain::playback::PlaybackError;
    use crate::domain::speech::AlignmentData;
    use crate::domain::text_segmenter::UnicodeWordSegmenter;
    use crate::infrastructure::memory::{InMemoryKeyValueStore, InMemorySessionManager};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct StaticCredential;

    #[async_trait]
    impl CredentialStorePort for StaticCredential {
        async fn get(&self) -> Result<Option<String>, CredentialError> {
            Ok(Some("test-key".to_string()))
        }

        async fn set(&self, _value: &str) -> Result<(), CredentialError> {
            Ok(())
        }
    }

    /// 读取 key 需要一段时间的存储
    struct SlowCredential;

    #[async_trait]
    impl CredentialStorePort for SlowCredential {
        async fn get(&self) -> Result<Option<String>, CredentialError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(Some("test-key".to_string()))
        }

        async fn set(&self, _value: &str) -> Result<(), CredentialError> {
            Ok(())
        }
    }

    struct NoPrompt;

    #[async_trait]
    impl CredentialPromptPort for NoPrompt {
        async fn solicit(&self) -> Option<String> {
            None
        }
    }

    /// 每个字符 0.1 秒的对齐
    fn even_alignment(text: &str) -> AlignmentData {
        let n = text.chars().count();
        AlignmentData {
            characters: text.chars().map(|c| c.to_string()).collect(),
            start_times: (0..n).map(|i| i as f64 * 0.1).collect(),
            end_times: (0..n).map(|i| (i + 1) as f64 * 0.1).collect(),
        }
    }

    #[derive(Default)]
    struct TestEngine {
        calls: AtomicUsize,
        fail: AtomicBool,
        gated: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl TtsEnginePort for TestEngine {
        async fn synthesize(
            &self,
            request: &SynthesisRequest,
            _api_key: &str,
        ) -> Result<AudioEntry, TtsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.gated.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(TtsError::ServiceError("HTTP 503".to_string()));
            }
            Ok(AudioEntry {
                audio: vec![0u8; 16],
                content_type: "audio/mpeg".to_string(),
                alignment: Some(even_alignment(&request.text)),
            })
        }
    }

    #[derive(Default)]
    struct OutputState {
        bound: bool,
        playing: bool,
        position: f64,
        ended: bool,
        error: Option<String>,
        binds: usize,
    }

    /// 位置由测试手动推进的输出
    #[derive(Default)]
    struct ScriptedOutput {
        state: Mutex<OutputState>,
    }

    impl ScriptedOutput {
        fn advance_to(&self, position: f64) {
            self.state.lock().unwrap().position = position;
        }

        fn end(&self) {
            self.state.lock().unwrap().ended = true;
        }

        fn is_playing(&self) -> bool {
            self.state.lock().unwrap().playing
        }

        fn binds(&self) -> usize {
            self.state.lock().unwrap().binds
        }
    }

    impl AudioOutputPort for ScriptedOutput {
        fn decode(&self, entry: Arc<AudioEntry>) -> Result<AudioHandle, PlaybackError> {
            let duration = entry
                .alignment
                .as_ref()
                .and_then(AlignmentData::last_end_time)
                .unwrap_or(1.0);
            Ok(AudioHandle::new(entry, duration))
        }

        fn bind(&self, _handle: &AudioHandle) -> Result<(), PlaybackError> {
            let mut state = self.state.lock().unwrap();
            state.bound = true;
            state.playing = false;
            state.position = 0.0;
            state.ended = false;
            state.binds += 1;
            Ok(())
        }

        fn play(&self) -> Result<(), PlaybackError> {
            let mut state = self.state.lock().unwrap();
            if !state.bound {
                return Err(PlaybackError::NoAudio);
            }
            state.playing = true;
            Ok(())
        }

        fn pause(&self) {
            self.state.lock().unwrap().playing = false;
        }

        fn set_position(&self, seconds: f64) {
            let mut state = self.state.lock().unwrap();
            state.position = seconds;
            state.ended = false;
        }

        fn position(&self) -> f64 {
            self.state.lock().unwrap().position
        }

        fn is_ended(&self) -> bool {
            self.state.lock().unwrap().ended
        }

        fn report_error(&self, reason: &str) {
            self.state.lock().unwrap().error = Some(reason.to_string());
        }

        fn take_error(&self) -> Option<String> {
            self.state.lock().unwrap().error.take()
        }

        fn release(&self) {
            let mut state = self.state.lock().unwrap();
            state.bound = false;
            state.playing = false;
            state.position = 0.0;
        }
    }

    #[derive(Default)]
    struct RecordingEvents {
        events: Mutex<Vec<PlaybackEvent>>,
    }

    impl RecordingEvents {
        fn states_of(&self, session_id: &str) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    PlaybackEvent::StateChanged {
                        session_id: id,
                        state,
                        ..
                    } if id == session_id => Some(state.clone()),
                    _ => None,
                })
                .collect()
        }

        fn progress_of(&self, session_id: &str) -> Vec<(f64, f64)> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    PlaybackEvent::Progress {
                        session_id: id,
                        position,
                        duration,
                        ..
                    } if id == session_id => Some((*position, *duration)),
                    _ => None,
                })
                .collect()
        }

        fn highlights_of(&self, session_id: &str) -> Vec<Option<usize>> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    PlaybackEvent::Highlight {
                        session_id: id,
                        index,
                    } if id == session_id => Some(*index),
                    _ => None,
                })
                .collect()
        }
    }

    impl PlaybackEventPort for RecordingEvents {
        fn publish(&self, event: PlaybackEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn release_session(&self, _session_id: &str) {}
    }

    struct Fixture {
        controller: Arc<PlaybackController>,
        engine: Arc<TestEngine>,
        output: Arc<ScriptedOutput>,
        events: Arc<RecordingEvents>,
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(StaticCredential))
    }

    fn fixture_with(store: Arc<dyn CredentialStorePort>) -> Fixture {
        let engine = Arc::new(TestEngine::default());
        let output = Arc::new(ScriptedOutput::default());
        let events = Arc::new(RecordingEvents::default());

        let cache = Arc::new(TtlCache::new(
            Arc::new(InMemoryKeyValueStore::new()),
            TtlCacheConfig::default(),
        ));
        let credentials = Arc::new(CredentialResolver::new(store, Arc::new(NoPrompt)));
        let synthesizer = Arc::new(SpeechSynthesizer::new(
            engine.clone(),
            cache,
            credentials,
            SynthesizerSettings::default(),
        ));

        let controller = Arc::new(PlaybackController::new(
            Arc::new(InMemorySessionManager::new()),
            output.clone(),
            synthesizer,
            Arc::new(UnicodeWordSegmenter::new()),
            events.clone(),
            PlaybackSettings {
                tick_interval: Duration::from_millis(10),
                default_locale: "en".to_string(),
            },
        ));

        Fixture {
            controller,
            engine,
            output,
            events,
        }
    }

    /// 让更新循环跑几轮
    async fn run_ticks() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_enters_loading_then_plays() {
        let f = fixture();
        let id = f.controller.create_session("The fox ran.", None).unwrap();

        let status = f.controller.start(&id).await.unwrap();

        assert_eq!(status.state, PlaybackState::Playing);
        assert!(status.is_bound);
        assert!(status.has_alignment);
        assert_eq!(status.word_count, 3);
        assert_eq!(f.engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.events.states_of(&id), vec!["loading", "playing"]);
        assert!(f.output.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_loading() {
        let f = fixture();
        let first = f.controller.create_session("The fox ran.", None).unwrap();
        f.controller.start(&first).await.unwrap();
        f.controller.stop(&first).await.unwrap();

        let second = f.controller.create_session("The fox ran.", None).unwrap();
        let status = f.controller.start(&second).await.unwrap();

        assert_eq!(status.state, PlaybackState::Playing);
        assert_eq!(f.engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.events.states_of(&second), vec!["playing"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_starting_second_session_stops_first() {
        let f = fixture();
        let a = f.controller.create_session("First story.", None).unwrap();
        let b = f.controller.create_session("Second story.", None).unwrap();

        f.controller.start(&a).await.unwrap();
        f.controller.start(&b).await.unwrap();

        let status_a = f.controller.status(&a).unwrap();
        assert_eq!(status_a.state, PlaybackState::Idle);
        assert!(!status_a.is_bound);
        assert!(status_a.duration.is_none());
        assert!(f.controller.audio(&a).is_err());

        let status_b = f.controller.status(&b).unwrap();
        assert_eq!(status_b.state, PlaybackState::Playing);
        assert_eq!(f.controller.bound_session().as_deref(), Some(b.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_and_highlight_follow_output() {
        let f = fixture();
        let id = f.controller.create_session("The fox ran.", None).unwrap();
        f.controller.start(&id).await.unwrap();

        // "The" [0,3) 0.0-0.3, "fox" [4,7) 0.4-0.7
        f.output.advance_to(0.55);
        run_ticks().await;

        let status = f.controller.status(&id).unwrap();
        assert!((status.position - 0.55).abs() < 1e-9);
        assert_eq!(status.highlight_index, Some(1));
        assert_eq!(f.events.highlights_of(&id), vec![Some(1)]);

        // 单词间隙不高亮
        f.output.advance_to(0.35);
        run_ticks().await;
        assert_eq!(f.controller.status(&id).unwrap().highlight_index, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume_keep_position() {
        let f = fixture();
        let id = f.controller.create_session("The fox ran.", None).unwrap();
        f.controller.start(&id).await.unwrap();

        f.output.advance_to(0.5);
        let status = f.controller.pause(&id).await.unwrap();
        assert_eq!(status.state, PlaybackState::Paused);
        assert!((status.position - 0.5).abs() < 1e-9);
        assert!(!f.output.is_playing());

        let status = f.controller.resume(&id).await.unwrap();
        assert_eq!(status.state, PlaybackState::Playing);
        assert!((f.output.position() - 0.5).abs() < 1e-9);
        assert_eq!(f.engine.calls.load(Ordering::SeqCst), 1);

        assert!(f.controller.resume(&id).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeking_suppresses_progress() {
        let f = fixture();
        let id = f.controller.create_session("The fox ran.", None).unwrap();
        f.controller.start(&id).await.unwrap();

        f.output.advance_to(0.2);
        run_ticks().await;

        f.controller.begin_seek(&id).await.unwrap();
        f.controller.preview_seek(&id, 0.9).await.unwrap();
        f.output.advance_to(0.3);
        run_ticks().await;

        let status = f.controller.status(&id).unwrap();
        assert!(status.is_seeking);
        assert_eq!(status.seek_preview, Some(0.9));
        assert!((status.position - 0.2).abs() < 1e-9);

        let status = f.controller.commit_seek(&id, 0.9).await.unwrap();
        assert!(!status.is_seeking);
        assert!((status.position - 0.9).abs() < 1e-9);
        assert!((f.output.position() - 0.9).abs() < 1e-9);
        assert_eq!(status.highlight_index, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_target_is_clamped_to_duration() {
        let f = fixture();
        let id = f.controller.create_session("The fox ran.", None).unwrap();
        f.controller.start(&id).await.unwrap();

        let status = f.controller.commit_seek(&id, 99.0).await.unwrap();
        assert!((status.position - 1.2).abs() < 1e-9);
        let status = f.controller.commit_seek(&id, -3.0).await.unwrap();
        assert_eq!(status.position, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_playback_retains_audio() {
        let f = fixture();
        let id = f.controller.create_session("The fox ran.", None).unwrap();
        f.controller.start(&id).await.unwrap();

        f.output.advance_to(1.2);
        f.output.end();
        run_ticks().await;

        let status = f.controller.status(&id).unwrap();
        assert_eq!(status.state, PlaybackState::Idle);
        assert_eq!(status.position, 0.0);
        assert_eq!(status.highlight_index, None);
        assert!(status.duration.is_some());
        let last_progress = f.events.progress_of(&id).last().copied().unwrap();
        assert_eq!(last_progress.0, 0.0);
        assert!((last_progress.1 - 1.2).abs() < 1e-9);
        assert!(!status.is_bound);
        assert!(f.controller.audio(&id).is_ok());

        // 重播不再请求合成
        let status = f.controller.start(&id).await.unwrap();
        assert_eq!(status.state, PlaybackState::Playing);
        assert_eq!(f.engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_error_revokes_audio() {
        let f = fixture();
        let id = f.controller.create_session("The fox ran.", None).unwrap();
        f.controller.start(&id).await.unwrap();

        let status = f.controller.report_error(&id, "device lost").await.unwrap();
        assert_eq!(status.state, PlaybackState::Playing);
        run_ticks().await;

        let status = f.controller.status(&id).unwrap();
        assert_eq!(status.state, PlaybackState::Idle);
        assert_eq!(status.last_error.as_deref(), Some("device lost"));
        assert!(status.duration.is_none());
        assert!(!status.is_bound);
        assert_eq!(
            f.events.states_of(&id),
            vec!["loading", "playing", "error", "idle"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_error_requires_bound_session() {
        let f = fixture();
        let id = f.controller.create_session("The fox ran.", None).unwrap();

        assert!(matches!(
            f.controller.report_error(&id, "decode failed").await,
            Err(ApplicationError::InvalidState(_))
        ));
        assert!(matches!(
            f.controller.report_error("missing", "decode failed").await,
            Err(ApplicationError::NotFound { .. })
        ));
        assert!(f.output.take_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_error_while_paused_fails_immediately() {
        let f = fixture();
        let id = f.controller.create_session("The fox ran.", None).unwrap();
        f.controller.start(&id).await.unwrap();
        f.controller.pause(&id).await.unwrap();

        let status = f.controller.report_error(&id, "decode failed").await.unwrap();

        assert_eq!(status.state, PlaybackState::Idle);
        assert_eq!(status.last_error.as_deref(), Some("decode failed"));
        assert!(status.duration.is_none());
        assert!(!status.is_bound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_start_synthesizes_once() {
        let f = fixture_with(Arc::new(SlowCredential));
        let id = f.controller.create_session("The fox ran.", None).unwrap();

        let spawn_start = || {
            let controller = f.controller.clone();
            let id = id.clone();
            tokio::spawn(async move { controller.start(&id).await })
        };
        let first = spawn_start();
        let second = spawn_start();

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(f.engine.calls.load(Ordering::SeqCst), 1);
        assert!(
            first.state == PlaybackState::Playing || second.state == PlaybackState::Playing
        );
        let status = f.controller.status(&id).unwrap();
        assert_eq!(status.state, PlaybackState::Playing);
        assert!(status.is_bound);
        assert_eq!(f.output.binds(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthesis_failure_returns_to_idle() {
        let f = fixture();
        f.engine.fail.store(true, Ordering::SeqCst);
        let id = f.controller.create_session("The fox ran.", None).unwrap();

        assert!(f.controller.start(&id).await.is_err());

        let status = f.controller.status(&id).unwrap();
        assert_eq!(status.state, PlaybackState::Idle);
        assert!(status.last_error.is_some());
        assert_eq!(f.output.binds(), 0);
    }

    #[tokio::test]
    async fn test_stop_during_synthesis_discards_result() {
        let f = fixture();
        f.engine.gated.store(true, Ordering::SeqCst);
        let id = f.controller.create_session("The fox ran.", None).unwrap();

        let pending = {
            let controller = f.controller.clone();
            let id = id.clone();
            tokio::spawn(async move { controller.start(&id).await })
        };
        f.engine.entered.notified().await;
        assert_eq!(
            f.controller.status(&id).unwrap().state,
            PlaybackState::Loading
        );

        f.controller.stop(&id).await.unwrap();
        f.engine.release.notify_one();

        let status = pending.await.unwrap().unwrap();
        assert_eq!(status.state, PlaybackState::Idle);
        assert!(status.duration.is_none());
        assert_eq!(f.output.binds(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_session() {
        let f = fixture();
        let id = f.controller.create_session("The fox ran.", None).unwrap();
        f.controller.start(&id).await.unwrap();

        f.controller.close(&id, "client closed").await.unwrap();

        assert!(f.controller.status(&id).is_err());
        assert!(f.controller.bound_session().is_none());
        assert!(f.controller.close(&id, "again").await.is_err());
    }

    #[test]
    fn test_create_session_rejects_empty_text() {
        let f = fixture();
        assert!(matches!(
            f.controller.create_session("  ", None),
            Err(ApplicationError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_words_are_segmented_once_at_creation() {
        let f = fixture();
        let id = f.controller.create_session("Hello, brave world!", Some("en-GB")).unwrap();

        let words = f.controller.words(&id).unwrap();
        let texts: Vec<_> = words.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "brave", "world"]);
        assert!(words.timings.is_none());
    }
}
