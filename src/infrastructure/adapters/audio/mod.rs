//! Audio Adapter - 音频解码与输出

mod clock_output;
mod probe;

pub use clock_output::ClockAudioOutput;
pub use probe::probe_duration;
