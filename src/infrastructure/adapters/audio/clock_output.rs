//! Clock Audio Output - 以单调时钟推进的音频输出
//!
//! 服务端不直接发声：客户端通过 `/api/audio/:session_id` 取音频自行播放，
//! 本输出只负责按真实时间推进播放位置，作为会话共享的唯一"播放头"。

use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::Instant;

use super::probe::probe_duration;
use crate::application::ports::AudioOutputPort;
use crate::domain::playback::{AudioHandle, PlaybackError};
use crate::domain::speech::{AudioEntry, OutputFormat};

#[derive(Debug, Default)]
struct ClockState {
    /// 已绑定音频的时长
    duration: Option<f64>,
    /// 播放中时记录起点
    playing_since: Option<Instant>,
    /// 起点对应的播放位置
    offset: f64,
    pending_error: Option<String>,
}

impl ClockState {
    fn position(&self) -> f64 {
        let duration = self.duration.unwrap_or(0.0);
        let elapsed = self
            .playing_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.offset + elapsed).min(duration)
    }
}

pub struct ClockAudioOutput {
    format: OutputFormat,
    state: Mutex<ClockState>,
}

impl ClockAudioOutput {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            state: Mutex::new(ClockState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioOutputPort for ClockAudioOutput {
    fn decode(&self, entry: Arc<AudioEntry>) -> Result<AudioHandle, PlaybackError> {
        let duration = probe_duration(&entry, &self.format)?;
        tracing::debug!(
            size_bytes = entry.size_bytes(),
            content_type = %entry.content_type,
            duration = duration,
            "Audio decoded"
        );
        Ok(AudioHandle::new(entry, duration))
    }

    fn bind(&self, handle: &AudioHandle) -> Result<(), PlaybackError> {
        let mut state = self.lock();
        *state = ClockState {
            duration: Some(handle.duration()),
            ..Default::default()
        };
        Ok(())
    }

    fn play(&self) -> Result<(), PlaybackError> {
        let mut state = self.lock();
        if state.duration.is_none() {
            return Err(PlaybackError::NoAudio);
        }
        if state.playing_since.is_none() {
            state.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.lock();
        state.offset = state.position();
        state.playing_since = None;
    }

    fn set_position(&self, seconds: f64) {
        let mut state = self.lock();
        let duration = state.duration.unwrap_or(0.0);
        state.offset = if seconds.is_finite() {
            seconds.clamp(0.0, duration)
        } else {
            0.0
        };
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
    }

    fn position(&self) -> f64 {
        self.lock().position()
    }

    fn is_ended(&self) -> bool {
        let state = self.lock();
        match state.duration {
            Some(duration) => state.playing_since.is_some() && state.position() >= duration,
            None => false,
        }
    }

    /// 下一次 tick 时由控制器处理
    fn report_error(&self, reason: &str) {
        self.lock().pending_error = Some(reason.to_string());
    }

    fn take_error(&self) -> Option<String> {
        self.lock().pending_error.take()
    }

    fn release(&self) {
        *self.lock() = ClockState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::tts::silent_wav;
    use std::time::Duration;

    fn decoded(output: &ClockAudioOutput, seconds: f64) -> AudioHandle {
        let entry = Arc::new(AudioEntry {
            audio: silent_wav(seconds, 8000),
            content_type: "audio/wav".to_string(),
            alignment: None,
        });
        output.decode(entry).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_follows_clock() {
        let output = ClockAudioOutput::new(OutputFormat::default());
        let handle = decoded(&output, 2.0);

        assert!(matches!(output.play(), Err(PlaybackError::NoAudio)));

        output.bind(&handle).unwrap();
        output.play().unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!((output.position() - 0.5).abs() < 1e-6);

        output.pause();
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!((output.position() - 0.5).abs() < 1e-6);
        assert!(!output.is_ended());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_and_end() {
        let output = ClockAudioOutput::new(OutputFormat::default());
        let handle = decoded(&output, 1.0);
        output.bind(&handle).unwrap();
        output.play().unwrap();

        output.set_position(0.8);
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!((output.position() - 0.9).abs() < 1e-6);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(output.is_ended());
        assert!((output.position() - 1.0).abs() < 1e-6);

        output.release();
        assert!(!output.is_ended());
        assert_eq!(output.position(), 0.0);
    }

    #[test]
    fn test_reported_error_is_taken_once() {
        let output = ClockAudioOutput::new(OutputFormat::default());
        output.report_error("device lost");
        assert_eq!(output.take_error().as_deref(), Some("device lost"));
        assert!(output.take_error().is_none());
    }
}
