//! Decoded sound clips.

use std::sync::Arc;
use std::time::Duration;

/// Identifies which output sink a mix pass is feeding.
///
/// The cable and monitor streams run on independent driver clocks with
/// independent block sizes, so every playback tracks one cursor per sink.
/// The two must never be coupled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkId {
    /// The virtual cable output (mic + sound effects).
    Cable,
    /// The local monitor output (sound effects only).
    Monitor,
}

/// An immutable, fully decoded sound clip.
///
/// Samples are interleaved `f32` at the engine's fixed format. Clips are
/// shared as `Arc<AudioClip>` so a clip outlives any single playback and the
/// same clip can play several times concurrently without copying.
///
/// # Example
///
/// ```
/// use mixpad::AudioClip;
///
/// let clip = AudioClip::new(vec![0.0; 9600], 48_000, 2);
/// assert_eq!(clip.frames(), 4800);
/// assert_eq!(clip.duration().as_millis(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioClip {
    /// Wraps decoded samples as a clip.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// The interleaved PCM samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Total interleaved sample count (frames × channels).
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Number of audio frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Playback duration at the clip's sample rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate.max(1)))
    }

    /// Convenience for `Arc::new(AudioClip::new(..))`.
    pub fn shared(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Arc<Self> {
        Arc::new(Self::new(samples, sample_rate, channels))
    }
}
