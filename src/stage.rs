//! Per-stream callback stages.
//!
//! Each audio stream owns one stage object, bound into its data callback
//! when the stream is built. A stage is a plain struct with a single
//! processing entry point, so the full real-time path can be driven directly
//! in tests without any audio hardware.
//!
//! All three entry points uphold the callback contract: no allocation, no
//! blocking lock acquisition, no I/O. Degradation is recorded in
//! [`EngineStats`] counters, never logged or raised from here.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::clip::SinkId;
use crate::engine::EngineStats;
use crate::mixer::{SoundMixer, Volumes};
use crate::transit::TransitBuffer;

/// Callback body for the capture stream.
///
/// Applies the anti-lag policy, then writes the captured block into the
/// transit buffer. Frames that do not fit (or arrive during contention) are
/// dropped and counted; capture self-heals on the next period.
pub struct CaptureStage {
    transit: Arc<TransitBuffer>,
    latency_threshold: usize,
    stats: Arc<EngineStats>,
}

impl CaptureStage {
    /// Binds a capture stage to a transit buffer.
    ///
    /// `latency_threshold` is in interleaved samples; unread transit audio
    /// above it is discarded before each write.
    pub fn new(
        transit: Arc<TransitBuffer>,
        latency_threshold: usize,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self {
            transit,
            latency_threshold,
            stats,
        }
    }

    /// Handles one block of captured interleaved samples.
    pub fn push_frames(&self, input: &[f32]) {
        let report = self.transit.push_with_antilag(input, self.latency_threshold);
        if report.skipped > 0 {
            self.stats
                .antilag_skipped
                .fetch_add(report.skipped as u64, Ordering::Relaxed);
        }
        if report.dropped > 0 {
            self.stats
                .capture_dropped
                .fetch_add(report.dropped as u64, Ordering::Relaxed);
        }
    }
}

/// Callback body for the cable output stream.
///
/// Produces mixed sound effects plus live microphone audio. This is the only
/// path where mic audio reaches any output.
pub struct CableStage {
    mixer: Arc<SoundMixer>,
    transit: Arc<TransitBuffer>,
    volumes: Arc<Volumes>,
    stats: Arc<EngineStats>,
    // Preallocated to transit capacity so render() never allocates.
    scratch: Vec<f32>,
}

impl CableStage {
    /// Binds a cable stage to the shared mixer, transit buffer and volumes.
    pub fn new(
        mixer: Arc<SoundMixer>,
        transit: Arc<TransitBuffer>,
        volumes: Arc<Volumes>,
        stats: Arc<EngineStats>,
    ) -> Self {
        let scratch = vec![0.0; transit.capacity()];
        Self {
            mixer,
            transit,
            volumes,
            stats,
            scratch,
        }
    }

    /// Fills one output block: zero, mix sound effects, add mic audio.
    ///
    /// Mic audio is read non-blocking from the transit buffer: only what is
    /// available, with no wait for a full block.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        if !self.mixer.mix(out, SinkId::Cable, self.volumes.sound()) {
            self.stats.cable_mix_skips.fetch_add(1, Ordering::Relaxed);
        }

        let want = out.len().min(self.scratch.len());
        let got = self.transit.pop_into(&mut self.scratch[..want]);
        let mic = self.volumes.mic();
        for (slot, sample) in out.iter_mut().zip(&self.scratch[..got]) {
            *slot += *sample * mic;
        }
    }
}

/// Callback body for the monitor output stream.
///
/// Sound effects only. Microphone audio is intentionally never added here:
/// the operator would hear their own voice with a short delay otherwise.
pub struct MonitorStage {
    mixer: Arc<SoundMixer>,
    volumes: Arc<Volumes>,
    stats: Arc<EngineStats>,
}

impl MonitorStage {
    /// Binds a monitor stage to the shared mixer and volumes.
    pub fn new(mixer: Arc<SoundMixer>, volumes: Arc<Volumes>, stats: Arc<EngineStats>) -> Self {
        Self {
            mixer,
            volumes,
            stats,
        }
    }

    /// Fills one output block with the sound-effect mix.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        if !self.mixer.mix(out, SinkId::Monitor, self.volumes.sound()) {
            self.stats.monitor_mix_skips.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClip;
    use crate::EngineConfig;

    fn parts() -> (
        Arc<SoundMixer>,
        Arc<TransitBuffer>,
        Arc<Volumes>,
        Arc<EngineStats>,
        EngineConfig,
    ) {
        let config = EngineConfig::default();
        (
            Arc::new(SoundMixer::new()),
            Arc::new(TransitBuffer::new(config.transit_capacity_samples())),
            Arc::new(Volumes::default()),
            Arc::new(EngineStats::default()),
            config,
        )
    }

    #[test]
    fn test_cable_blends_mic_over_sounds() {
        let (mixer, transit, volumes, stats, config) = parts();
        mixer.start_playback(MockClip::constant(0.25, 4, &config));

        let capture = CaptureStage::new(
            Arc::clone(&transit),
            config.latency_threshold_samples(),
            Arc::clone(&stats),
        );
        capture.push_frames(&[0.5; 8]);

        let mut cable = CableStage::new(mixer, transit, volumes, stats);
        let mut out = vec![0.0f32; 8];
        cable.render(&mut out);

        for slot in &out {
            assert!((slot - 0.75).abs() < 1e-6);
        }
    }

    #[test]
    fn test_monitor_never_contains_mic_audio() {
        let (mixer, transit, volumes, stats, config) = parts();
        volumes.set_mic(2.0);

        let capture = CaptureStage::new(
            Arc::clone(&transit),
            config.latency_threshold_samples(),
            Arc::clone(&stats),
        );
        capture.push_frames(&[0.9; 64]);

        let mut monitor = MonitorStage::new(mixer, volumes, stats);
        let mut out = vec![0.0f32; 64];
        monitor.render(&mut out);

        assert!(out.iter().all(|s| *s == 0.0));
        // The mic data is still queued for the cable side.
        assert_eq!(transit.available_read(), 64);
    }

    #[test]
    fn test_zero_mic_volume_yields_sound_only_cable_mix() {
        let (mixer, transit, volumes, stats, config) = parts();
        volumes.set_mic(0.0);
        mixer.start_playback(MockClip::constant(0.3, 8, &config));

        let capture = CaptureStage::new(
            Arc::clone(&transit),
            config.latency_threshold_samples(),
            Arc::clone(&stats),
        );
        capture.push_frames(&[0.8; 16]);

        let mut cable = CableStage::new(mixer, Arc::clone(&transit), volumes, stats);
        let mut out = vec![0.0f32; 16];
        cable.render(&mut out);

        for slot in &out {
            assert!((slot - 0.3).abs() < 1e-6);
        }
        // The mic data was still consumed, just at zero gain.
        assert_eq!(transit.available_read(), 0);
    }

    #[test]
    fn test_cable_reads_partial_mic_block() {
        let (mixer, transit, volumes, stats, config) = parts();

        let capture = CaptureStage::new(
            Arc::clone(&transit),
            config.latency_threshold_samples(),
            Arc::clone(&stats),
        );
        capture.push_frames(&[1.0; 4]);

        let mut cable = CableStage::new(mixer, transit, volumes, stats);
        let mut out = vec![0.0f32; 16];
        cable.render(&mut out);

        assert!(out[..4].iter().all(|s| *s == 1.0));
        assert!(out[4..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_capture_antilag_counts_discards() {
        let (_, _, _, stats, _) = parts();
        // Tiny buffer: threshold 8 samples, capacity 32.
        let transit = Arc::new(TransitBuffer::new(32));
        let capture = CaptureStage::new(Arc::clone(&transit), 8, Arc::clone(&stats));

        capture.push_frames(&[0.1; 16]);
        assert_eq!(stats.snapshot().antilag_skipped_samples, 0);

        // Unread is 16 > 8: the next push discards the 8 oldest first.
        capture.push_frames(&[0.2; 8]);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.antilag_skipped_samples, 8);
        assert!(transit.available_read() <= 8 + 8);
    }

    #[test]
    fn test_capture_full_buffer_counts_drops() {
        let (_, _, _, stats, _) = parts();
        let transit = Arc::new(TransitBuffer::new(8));
        // Threshold at capacity: nothing is ever skipped, so a too-large
        // block must be dropped instead.
        let capture = CaptureStage::new(Arc::clone(&transit), 8, Arc::clone(&stats));

        capture.push_frames(&[0.1; 12]);
        assert_eq!(stats.snapshot().capture_dropped_samples, 4);
        assert_eq!(transit.available_read(), 8);
    }
}
