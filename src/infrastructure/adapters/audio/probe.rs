//! 音频时长探测 - 基于 symphonia

use std::io::Cursor;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::domain::playback::PlaybackError;
use crate::domain::speech::{AudioEntry, OutputFormat};

/// 裸 PCM 未声明采样率时使用
const DEFAULT_PCM_SAMPLE_RATE: u32 = 16000;

/// 探测音频时长（秒）
///
/// `audio/pcm` 按 16-bit 单声道直接计算；其余格式交给 symphonia 解析容器
pub fn probe_duration(entry: &AudioEntry, format: &OutputFormat) -> Result<f64, PlaybackError> {
    if entry.audio.is_empty() {
        return Err(PlaybackError::DecodeFailed("empty audio".to_string()));
    }

    if entry.content_type == "audio/pcm" {
        let sample_rate = format.pcm_sample_rate().unwrap_or(DEFAULT_PCM_SAMPLE_RATE);
        return Ok(entry.audio.len() as f64 / 2.0 / sample_rate as f64);
    }

    probe_container(&entry.audio, extension_for(&entry.content_type))
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        _ => "mp3",
    }
}

fn probe_container(data: &[u8], extension: &str) -> Result<f64, PlaybackError> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::DecodeFailed(format!("Probe failed: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| PlaybackError::DecodeFailed("No audio track found".to_string()))?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| PlaybackError::DecodeFailed("Unknown sample rate".to_string()))?;

    if let Some(n_frames) = params.n_frames {
        return Ok(n_frames as f64 / sample_rate as f64);
    }

    // 容器未声明总帧数（常见于无 Xing 头的 MP3），逐包累加
    let mut total: u64 = 0;
    loop {
        match format.next_packet() {
            Ok(packet) if packet.track_id() == track_id => total += packet.dur,
            Ok(_) => continue,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(PlaybackError::DecodeFailed(format!(
                    "Packet read error: {}",
                    e
                )))
            }
        }
    }

    let seconds = match params.time_base {
        Some(tb) => {
            let time = tb.calc_time(total);
            time.seconds as f64 + time.frac
        }
        None => total as f64 / sample_rate as f64,
    };
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::tts::silent_wav;

    fn entry(audio: Vec<u8>, content_type: &str) -> AudioEntry {
        AudioEntry {
            audio,
            content_type: content_type.to_string(),
            alignment: None,
        }
    }

    #[test]
    fn test_wav_duration() {
        let wav = entry(silent_wav(0.5, 16000), "audio/wav");
        let duration = probe_duration(&wav, &OutputFormat::default()).unwrap();
        assert!((duration - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_pcm_duration_uses_format_rate() {
        let pcm = entry(vec![0u8; 44100], "audio/pcm");
        let duration = probe_duration(&pcm, &OutputFormat::new("pcm_22050")).unwrap();
        assert!((duration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let garbage = entry(vec![0x42; 256], "audio/mpeg");
        assert!(matches!(
            probe_duration(&garbage, &OutputFormat::default()),
            Err(PlaybackError::DecodeFailed(_))
        ));
        let empty = entry(Vec::new(), "audio/mpeg");
        assert!(probe_duration(&empty, &OutputFormat::default()).is_err());
    }
}
