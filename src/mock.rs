//! Synthetic clips for testing without audio hardware or files.
//!
//! Everything the mixing path consumes is an [`AudioClip`], so tests (and
//! CI, where no audio devices exist) can drive the engine end to end by
//! generating clips directly instead of decoding files.

use std::sync::Arc;

use crate::clip::AudioClip;
use crate::config::EngineConfig;

/// Generators for deterministic test clips at the engine format.
///
/// # Example
///
/// ```
/// use mixpad::{mock::MockClip, EngineConfig};
///
/// let config = EngineConfig::default();
/// let clip = MockClip::sine(440.0, 4800, &config);
/// assert_eq!(clip.frames(), 4800);
/// ```
pub struct MockClip;

impl MockClip {
    /// A clip of `frames` frames of silence.
    pub fn silence(frames: usize, config: &EngineConfig) -> Arc<AudioClip> {
        AudioClip::shared(
            vec![0.0; frames * config.channels as usize],
            config.sample_rate,
            config.channels,
        )
    }

    /// A clip where every sample holds `value`.
    ///
    /// Convenient for additivity assertions: mixing two constant clips must
    /// produce the sum of the constants.
    pub fn constant(value: f32, frames: usize, config: &EngineConfig) -> Arc<AudioClip> {
        AudioClip::shared(
            vec![value; frames * config.channels as usize],
            config.sample_rate,
            config.channels,
        )
    }

    /// A sine tone at `frequency` Hz, identical on all channels.
    pub fn sine(frequency: f64, frames: usize, config: &EngineConfig) -> Arc<AudioClip> {
        let channels = config.channels as usize;
        let rate = f64::from(config.sample_rate);
        let mut samples = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            let t = i as f64 / rate;
            let value = (2.0 * std::f64::consts::PI * frequency * t).sin() as f32;
            for _ in 0..channels {
                samples.push(value);
            }
        }
        AudioClip::shared(samples, config.sample_rate, config.channels)
    }

    /// A clip whose interleaved sample `i` holds the value `i`.
    ///
    /// Makes cursor positions directly visible in mixed output.
    pub fn ramp(frames: usize, config: &EngineConfig) -> Arc<AudioClip> {
        let count = frames * config.channels as usize;
        let samples = (0..count).map(|i| i as f32).collect();
        AudioClip::shared(samples, config.sample_rate, config.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_zero() {
        let clip = MockClip::silence(10, &EngineConfig::default());
        assert_eq!(clip.frames(), 10);
        assert!(clip.samples().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_sine_starts_at_zero_and_oscillates() {
        let clip = MockClip::sine(440.0, 480, &EngineConfig::default());
        assert_eq!(clip.samples()[0], 0.0);
        assert!(clip.samples().iter().any(|s| *s > 0.5));
        assert!(clip.samples().iter().any(|s| *s < -0.5));
    }

    #[test]
    fn test_ramp_encodes_sample_index() {
        let clip = MockClip::ramp(3, &EngineConfig::default());
        assert_eq!(clip.samples(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
