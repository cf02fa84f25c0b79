//! Playback Context - Aggregate Root

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AudioHandle, PlaybackError, PlaybackState};
use crate::domain::speech::{build_word_timings, highlighted_index_at, WordTiming};
use crate::domain::text_segmenter::{WordSegmenter, WordSpan};

/// 播放会话聚合根（每个 UI 实例一个）
///
/// 不变量:
/// - 状态迁移必须符合 [`PlaybackState::can_transition_to`]
/// - 文本只分词一次，`word_spans` 一旦生成不再改变
/// - `is_seeking` 期间播放进度不覆盖 `last_known_position`
#[derive(Debug, Clone)]
pub struct PlayerSession {
    id: String,
    text: String,
    locale: String,
    state: PlaybackState,
    audio_handle: Option<AudioHandle>,
    last_known_position: f64,
    is_seeking: bool,
    seek_preview: Option<f64>,
    word_spans: Option<Vec<WordSpan>>,
    word_timings: Option<Vec<WordTiming>>,
    current_highlight_index: Option<usize>,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl PlayerSession {
    pub fn new(text: impl Into<String>, locale: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            locale: locale.into(),
            state: PlaybackState::Idle,
            audio_handle: None,
            last_known_position: 0.0,
            is_seeking: false,
            seek_preview: None,
            word_spans: None,
            word_timings: None,
            current_highlight_index: None,
            last_error: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// 状态迁移
    pub fn transition(&mut self, next: PlaybackState) -> Result<(), PlaybackError> {
        if self.state == next {
            return Ok(());
        }
        if !self.state.can_transition_to(next) {
            return Err(PlaybackError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        if next != PlaybackState::Error {
            self.last_error = None;
        }
        self.touch();
        Ok(())
    }

    /// 分词（幂等，已分词时直接返回缓存结果）
    pub fn ensure_segmented(&mut self, segmenter: &dyn WordSegmenter) -> &[WordSpan] {
        if self.word_spans.is_none() {
            self.word_spans = Some(segmenter.segment(&self.text, &self.locale));
        }
        self.word_spans.as_deref().unwrap_or_default()
    }

    /// 挂载已解码的音频，并据对齐数据构建单词时间表
    ///
    /// 对齐不可用时 `word_timings` 为 `None`，音频照常播放。
    pub fn attach(&mut self, handle: AudioHandle) {
        let spans = self.word_spans.as_deref().unwrap_or_default();
        self.word_timings =
            build_word_timings(&self.text, spans, handle.entry().alignment.as_ref());
        self.audio_handle = Some(handle);
        self.current_highlight_index = None;
        self.touch();
    }

    /// 释放音频资源
    pub fn revoke(&mut self) {
        self.audio_handle = None;
        self.word_timings = None;
        self.current_highlight_index = None;
        self.last_known_position = 0.0;
        self.is_seeking = false;
        self.seek_preview = None;
    }

    /// 播放结束：归零、回到 idle，保留音频句柄以便立即重播
    pub fn finish(&mut self) -> Result<(), PlaybackError> {
        self.transition(PlaybackState::Idle)?;
        self.last_known_position = 0.0;
        self.current_highlight_index = None;
        self.is_seeking = false;
        self.seek_preview = None;
        Ok(())
    }

    /// 失败：释放资源并回到 idle，保留错误信息
    ///
    /// `Error` 只是瞬时状态，由控制器作为事件发布，会话本身直接落回 idle。
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.revoke();
        self.state = PlaybackState::Idle;
        self.last_error = Some(reason.into());
        self.touch();
    }

    /// 显式停止：释放资源并回到 idle
    pub fn stop(&mut self) {
        self.revoke();
        self.state = PlaybackState::Idle;
        self.touch();
    }

    /// 开始拖动进度
    pub fn begin_seek(&mut self) {
        self.is_seeking = true;
        self.touch();
    }

    /// 拖动中的预览位置
    pub fn preview_seek(&mut self, target: f64) -> f64 {
        let target = self.clamp_position(target);
        self.is_seeking = true;
        self.seek_preview = Some(target);
        target
    }

    /// 松开拖动：确定目标位置并恢复正常进度更新
    pub fn commit_seek(&mut self, target: f64) -> f64 {
        let target = self.clamp_position(target);
        self.is_seeking = false;
        self.seek_preview = None;
        self.last_known_position = target;
        self.touch();
        target
    }

    /// 记录播放进度（拖动期间忽略）
    ///
    /// 返回是否实际更新
    pub fn record_position(&mut self, position: f64) -> bool {
        if self.is_seeking {
            return false;
        }
        self.last_known_position = position;
        true
    }

    /// 按时刻刷新高亮下标
    ///
    /// 高亮发生变化时返回 `Some(新下标)`
    pub fn refresh_highlight(&mut self, t: f64) -> Option<Option<usize>> {
        let next = self
            .word_timings
            .as_deref()
            .and_then(|timings| highlighted_index_at(timings, t));
        if next == self.current_highlight_index {
            return None;
        }
        self.current_highlight_index = next;
        Some(next)
    }

    fn clamp_position(&self, target: f64) -> f64 {
        let target = if target.is_finite() { target.max(0.0) } else { 0.0 };
        match &self.audio_handle {
            Some(handle) => target.min(handle.duration()),
            None => target,
        }
    }

    /// 更新最后活动时间
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    // Getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn audio_handle(&self) -> Option<&AudioHandle> {
        self.audio_handle.as_ref()
    }

    pub fn last_known_position(&self) -> f64 {
        self.last_known_position
    }

    pub fn is_seeking(&self) -> bool {
        self.is_seeking
    }

    pub fn seek_preview(&self) -> Option<f64> {
        self.seek_preview
    }

    pub fn word_spans(&self) -> Option<&[WordSpan]> {
        self.word_spans.as_deref()
    }

    pub fn word_timings(&self) -> Option<&[WordTiming]> {
        self.word_timings.as_deref()
    }

    pub fn current_highlight_index(&self) -> Option<usize> {
        self.current_highlight_index
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::speech::{AlignmentData, AudioEntry};
    use crate::domain::text_segmenter::UnicodeWordSegmenter;
    use std::sync::Arc;

    fn handle_for(text: &str, duration: f64) -> AudioHandle {
        let n = text.chars().count();
        let entry = AudioEntry {
            audio: vec![0u8; 16],
            content_type: "audio/mpeg".to_string(),
            alignment: Some(AlignmentData {
                characters: text.chars().map(|c| c.to_string()).collect(),
                start_times: (0..n).map(|i| i as f64 * 0.1).collect(),
                end_times: (0..n).map(|i| (i + 1) as f64 * 0.1).collect(),
            }),
        };
        AudioHandle::new(Arc::new(entry), duration)
    }

    #[test]
    fn test_session_starts_idle() {
        let session = PlayerSession::new("Hello world", "en");
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.audio_handle().is_none());
        assert!(session.word_spans().is_none());
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut session = PlayerSession::new("Hello", "en");
        let result = session.transition(PlaybackState::Paused);
        assert!(matches!(result, Err(PlaybackError::InvalidTransition { .. })));
        assert_eq!(session.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_segmentation_happens_once() {
        let mut session = PlayerSession::new("Hello world", "en");
        let segmenter = UnicodeWordSegmenter::new();

        let first = session.ensure_segmented(&segmenter).to_vec();
        let second = session.ensure_segmented(&segmenter).to_vec();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(session.word_spans().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_attach_builds_timings_and_highlight() {
        let mut session = PlayerSession::new("Hello world", "en");
        session.ensure_segmented(&UnicodeWordSegmenter::new());
        session.attach(handle_for("Hello world", 1.1));

        assert_eq!(session.word_timings().map(|t| t.len()), Some(2));
        assert_eq!(session.refresh_highlight(0.2), Some(Some(0)));
        // 同一个单词内不重复通知
        assert_eq!(session.refresh_highlight(0.3), None);
        assert_eq!(session.refresh_highlight(0.55), Some(None));
        assert_eq!(session.refresh_highlight(0.8), Some(Some(1)));
    }

    #[test]
    fn test_attach_with_mismatched_alignment_disables_highlight() {
        let mut session = PlayerSession::new("Hello world", "en");
        session.ensure_segmented(&UnicodeWordSegmenter::new());
        session.attach(handle_for("Hello", 0.5));

        assert!(session.word_timings().is_none());
        assert!(session.audio_handle().is_some());
        assert_eq!(session.refresh_highlight(0.2), None);
    }

    #[test]
    fn test_seek_suppresses_position_updates() {
        let mut session = PlayerSession::new("Hello world", "en");
        session.attach(handle_for("Hello world", 1.1));

        session.begin_seek();
        assert!(!session.record_position(0.4));
        assert_eq!(session.preview_seek(0.7), 0.7);
        assert_eq!(session.last_known_position(), 0.0);

        // 超出时长的目标被截断
        assert_eq!(session.commit_seek(5.0), 1.1);
        assert!(!session.is_seeking());
        assert!(session.record_position(0.9));
        assert_eq!(session.last_known_position(), 0.9);
    }

    #[test]
    fn test_finish_keeps_handle() {
        let mut session = PlayerSession::new("Hello world", "en");
        session.attach(handle_for("Hello world", 1.1));
        session.transition(PlaybackState::Playing).unwrap();
        session.record_position(1.0);

        session.finish().unwrap();
        assert_eq!(session.state(), PlaybackState::Idle);
        assert_eq!(session.last_known_position(), 0.0);
        assert!(session.audio_handle().is_some());
    }

    #[test]
    fn test_fail_revokes_and_records_error() {
        let mut session = PlayerSession::new("Hello world", "en");
        session.transition(PlaybackState::Loading).unwrap();

        session.fail("network down");
        assert_eq!(session.state(), PlaybackState::Idle);
        assert_eq!(session.last_error(), Some("network down"));
        assert!(session.audio_handle().is_none());

        // 再次进入 loading 时清除错误标记
        session.transition(PlaybackState::Loading).unwrap();
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_stop_revokes_handle() {
        let mut session = PlayerSession::new("Hello world", "en");
        session.attach(handle_for("Hello world", 1.1));
        session.transition(PlaybackState::Playing).unwrap();

        session.stop();
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.audio_handle().is_none());
    }
}
