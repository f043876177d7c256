//! Engine configuration.

use std::time::Duration;

/// Fixed audio format and buffering parameters.
///
/// Every stream the engine opens runs at this one interleaved `f32` format;
/// clips are converted at decode time so the real-time paths never resample.
/// The configuration is immutable once the engine is constructed.
///
/// # Example
///
/// ```
/// use mixpad::EngineConfig;
/// use std::time::Duration;
///
/// let config = EngineConfig {
///     latency_threshold: Duration::from_millis(30),
///     ..Default::default()
/// };
/// assert_eq!(config.sample_rate, 48_000);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Sample rate in Hz for capture, cable and monitor. Default: 48 000.
    pub sample_rate: u32,

    /// Interleaved channel count. Default: 2 (stereo).
    pub channels: u16,

    /// Capacity of the mic transit buffer.
    ///
    /// Fixed at `init` time; the buffer never grows. Default: 100 ms.
    pub transit_capacity: Duration,

    /// Anti-lag threshold.
    ///
    /// When unread transit audio exceeds this much, the capture callback
    /// discards the oldest excess before writing, bounding capture-to-cable
    /// latency under sustained backpressure. Default: 50 ms.
    pub latency_threshold: Duration,
}

impl EngineConfig {
    /// Interleaved sample count covering `duration` at this format.
    pub fn samples_for(&self, duration: Duration) -> usize {
        let frames = (f64::from(self.sample_rate) * duration.as_secs_f64()) as usize;
        frames * self.channels as usize
    }

    /// Transit buffer capacity in interleaved samples.
    pub fn transit_capacity_samples(&self) -> usize {
        self.samples_for(self.transit_capacity)
    }

    /// Anti-lag threshold in interleaved samples.
    pub fn latency_threshold_samples(&self) -> usize {
        self.samples_for(self.latency_threshold)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            transit_capacity: Duration::from_millis(100),
            latency_threshold: Duration::from_millis(50),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.channels, 2);
        assert_eq!(config.transit_capacity, Duration::from_millis(100));
        assert_eq!(config.latency_threshold, Duration::from_millis(50));
    }

    #[test]
    fn test_samples_for_duration() {
        let config = EngineConfig::default();
        // 100ms at 48kHz stereo = 4800 frames = 9600 samples
        assert_eq!(config.transit_capacity_samples(), 9600);
        // 50ms = 2400 frames = 4800 samples
        assert_eq!(config.latency_threshold_samples(), 4800);
    }

    #[test]
    fn test_threshold_below_capacity() {
        let config = EngineConfig::default();
        assert!(config.latency_threshold_samples() < config.transit_capacity_samples());
    }
}
