//! The engine: lifecycle, control operations, and stream wiring.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleRate, Stream, StreamConfig};
use tracing::{error, info, warn};

use crate::clip::AudioClip;
use crate::config::EngineConfig;
use crate::decode::decode_file;
use crate::device::{self, DeviceDescriptor};
use crate::error::EngineError;
use crate::mixer::{SoundMixer, Volumes};
use crate::stage::{CableStage, CaptureStage, MonitorStage};
use crate::transit::TransitBuffer;

/// Degradation counters written by the real-time callbacks.
///
/// Real-time failures never raise errors; they drop bounded amounts of audio
/// and are tallied here. Read a coherent-enough view via
/// [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct EngineStats {
    pub(crate) capture_dropped: AtomicU64,
    pub(crate) antilag_skipped: AtomicU64,
    pub(crate) cable_mix_skips: AtomicU64,
    pub(crate) monitor_mix_skips: AtomicU64,
}

impl EngineStats {
    /// Copies the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            capture_dropped_samples: self.capture_dropped.load(Ordering::Relaxed),
            antilag_skipped_samples: self.antilag_skipped.load(Ordering::Relaxed),
            cable_mix_skips: self.cable_mix_skips.load(Ordering::Relaxed),
            monitor_mix_skips: self.monitor_mix_skips.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Captured samples dropped because the transit buffer was full or
    /// contended.
    pub capture_dropped_samples: u64,
    /// Stale samples discarded by the anti-lag policy.
    pub antilag_skipped_samples: u64,
    /// Cable mix passes skipped due to lock contention.
    pub cable_mix_skips: u64,
    /// Monitor mix passes skipped due to lock contention.
    pub monitor_mix_skips: u64,
}

/// The three live streams plus the buffer that bridges them.
///
/// Streams stop when dropped (CPAL RAII), and field order matters: all three
/// streams go down before the transit handle is released, so no callback can
/// outlive the buffer it writes to.
struct RunningStreams {
    _capture: Stream,
    _cable: Stream,
    _monitor: Stream,
    _transit: Arc<TransitBuffer>,
}

/// Real-time audio routing and mixing engine.
///
/// One owned instance per process area that needs it; there are no process
/// globals. Construct with [`new`](Self::new), bring up the streams with
/// [`init`](Self::init), and feed it control-plane calls from any
/// non-real-time thread. See the [crate docs](crate) for the architecture.
pub struct AudioEngine {
    config: EngineConfig,
    mixer: Arc<SoundMixer>,
    volumes: Arc<Volumes>,
    stats: Arc<EngineStats>,
    running: Option<RunningStreams>,
    input_devices: Vec<DeviceDescriptor>,
    output_devices: Vec<DeviceDescriptor>,
}

impl AudioEngine {
    /// Creates an engine with no streams running.
    ///
    /// Device lists are populated eagerly so the control layer can present
    /// choices before `init`; enumeration failure is logged and leaves the
    /// lists empty (refreshable later).
    pub fn new(config: EngineConfig) -> Self {
        let mut engine = Self {
            config,
            mixer: Arc::new(SoundMixer::new()),
            volumes: Arc::new(Volumes::default()),
            stats: Arc::new(EngineStats::default()),
            running: None,
            input_devices: Vec::new(),
            output_devices: Vec::new(),
        };
        if let Err(e) = engine.refresh_device_list() {
            warn!(error = %e, "initial device enumeration failed");
        }
        engine
    }

    /// (Re)initializes buffers and starts the capture, cable and monitor
    /// streams.
    ///
    /// Idempotent: a previous initialization is torn down first. Empty
    /// device names select the system default.
    ///
    /// The capture device gets one retry against the system default if the
    /// named device fails to open. Output devices are not retried: a cable
    /// or monitor failure surfaces as [`EngineError::DeviceUnavailable`] and
    /// leaves the engine uninitialized.
    ///
    /// # Errors
    ///
    /// Any device resolution, stream build, or stream start failure.
    pub fn init(
        &mut self,
        input_name: &str,
        cable_name: &str,
        monitor_name: &str,
    ) -> Result<(), EngineError> {
        if self.running.is_some() {
            self.shutdown();
        }

        let transit = Arc::new(TransitBuffer::new(self.config.transit_capacity_samples()));
        let stream_config = StreamConfig {
            channels: self.config.channels,
            sample_rate: SampleRate(self.config.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let capture = self.open_capture(input_name, &stream_config, &transit)?;
        let cable = self.open_cable(cable_name, &stream_config, Arc::clone(&transit))?;
        let monitor = self.open_monitor(monitor_name, &stream_config)?;

        capture
            .play()
            .map_err(|e| EngineError::Backend(e.to_string()))?;
        cable.play().map_err(|e| EngineError::DeviceUnavailable {
            name: display_name(cable_name),
            reason: e.to_string(),
        })?;
        monitor.play().map_err(|e| EngineError::DeviceUnavailable {
            name: display_name(monitor_name),
            reason: e.to_string(),
        })?;

        info!(
            input = display_name(input_name).as_str(),
            cable = display_name(cable_name).as_str(),
            monitor = display_name(monitor_name).as_str(),
            sample_rate = self.config.sample_rate,
            "engine initialized"
        );

        self.running = Some(RunningStreams {
            _capture: capture,
            _cable: cable,
            _monitor: monitor,
            _transit: transit,
        });
        Ok(())
    }

    /// Stops all three streams and releases the transit buffer.
    ///
    /// Safe to call when not initialized. Playing sounds are kept; they
    /// resume mixing if the engine is initialized again.
    pub fn shutdown(&mut self) {
        if self.running.take().is_some() {
            info!("engine shut down");
        }
    }

    /// Whether the streams are currently up.
    pub fn is_initialized(&self) -> bool {
        self.running.is_some()
    }

    /// Re-enumerates capture and playback devices.
    pub fn refresh_device_list(&mut self) -> Result<(), EngineError> {
        self.input_devices = device::list_input_devices()?;
        self.output_devices = device::list_output_devices()?;
        Ok(())
    }

    /// Capture devices from the last refresh.
    pub fn input_devices(&self) -> &[DeviceDescriptor] {
        &self.input_devices
    }

    /// Playback devices from the last refresh.
    pub fn output_devices(&self) -> &[DeviceDescriptor] {
        &self.output_devices
    }

    /// Decodes `path` synchronously and starts playing it on both sinks.
    ///
    /// Runs on the caller's (control) thread; the real-time paths only see
    /// the finished clip. On decode failure nothing is enqueued and the
    /// error is returned for the control layer to report.
    pub fn play_sound_file(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let clip = decode_file(path.as_ref(), &self.config)?;
        self.mixer.start_playback(clip);
        Ok(())
    }

    /// Starts playing an already decoded clip.
    ///
    /// Lets the control layer decode each pad's file once and re-trigger it
    /// without touching the filesystem.
    pub fn play_clip(&self, clip: Arc<AudioClip>) {
        self.mixer.start_playback(clip);
    }

    /// Discards every playing sound on both sinks.
    pub fn stop_all_sounds(&self) {
        self.mixer.stop_all();
    }

    /// Sets the live microphone gain (cable sink only).
    pub fn set_mic_volume(&self, gain: f32) {
        self.volumes.set_mic(gain);
    }

    /// Sets the sound-effect gain (both sinks).
    pub fn set_sound_volume(&self, gain: f32) {
        self.volumes.set_sound(gain);
    }

    /// Current microphone gain.
    pub fn mic_volume(&self) -> f32 {
        self.volumes.mic()
    }

    /// Current sound-effect gain.
    pub fn sound_volume(&self) -> f32 {
        self.volumes.sound()
    }

    /// Number of sounds currently in flight.
    pub fn active_sound_count(&self) -> usize {
        self.mixer.active_count()
    }

    /// Current degradation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// The engine's fixed format.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn open_capture(
        &self,
        name: &str,
        stream_config: &StreamConfig,
        transit: &Arc<TransitBuffer>,
    ) -> Result<Stream, EngineError> {
        if let Some(requested) = device::find_input_device(name)? {
            match self.build_capture_stream(&requested, stream_config, transit) {
                Ok(stream) => return Ok(stream),
                Err(e) => warn!(
                    device = name,
                    error = %e,
                    "capture device failed, falling back to system default"
                ),
            }
        }
        let default = device::default_input_device()?;
        self.build_capture_stream(&default, stream_config, transit)
    }

    fn build_capture_stream(
        &self,
        device: &Device,
        stream_config: &StreamConfig,
        transit: &Arc<TransitBuffer>,
    ) -> Result<Stream, EngineError> {
        let stage = CaptureStage::new(
            Arc::clone(transit),
            self.config.latency_threshold_samples(),
            Arc::clone(&self.stats),
        );
        device
            .build_input_stream(
                stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| stage.push_frames(data),
                |err| error!(error = %err, "capture stream error"),
                None,
            )
            .map_err(|e| EngineError::Backend(e.to_string()))
    }

    fn open_cable(
        &self,
        name: &str,
        stream_config: &StreamConfig,
        transit: Arc<TransitBuffer>,
    ) -> Result<Stream, EngineError> {
        let device = self.resolve_output(name)?;
        let mut stage = CableStage::new(
            Arc::clone(&self.mixer),
            transit,
            Arc::clone(&self.volumes),
            Arc::clone(&self.stats),
        );
        device
            .build_output_stream(
                stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| stage.render(data),
                |err| error!(error = %err, "cable stream error"),
                None,
            )
            .map_err(|e| EngineError::DeviceUnavailable {
                name: display_name(name),
                reason: e.to_string(),
            })
    }

    fn open_monitor(
        &self,
        name: &str,
        stream_config: &StreamConfig,
    ) -> Result<Stream, EngineError> {
        let device = self.resolve_output(name)?;
        let mut stage = MonitorStage::new(
            Arc::clone(&self.mixer),
            Arc::clone(&self.volumes),
            Arc::clone(&self.stats),
        );
        device
            .build_output_stream(
                stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| stage.render(data),
                |err| error!(error = %err, "monitor stream error"),
                None,
            )
            .map_err(|e| EngineError::DeviceUnavailable {
                name: display_name(name),
                reason: e.to_string(),
            })
    }

    fn resolve_output(&self, name: &str) -> Result<Device, EngineError> {
        match device::find_output_device(name)? {
            Some(device) => Ok(device),
            None => device::default_output_device(),
        }
    }
}

fn display_name(name: &str) -> String {
    if name.is_empty() {
        "system default".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClip;

    #[test]
    fn test_new_engine_is_uninitialized() {
        let engine = AudioEngine::new(EngineConfig::default());
        assert!(!engine.is_initialized());
        assert_eq!(engine.active_sound_count(), 0);
        assert_eq!(engine.stats(), StatsSnapshot::default());
    }

    #[test]
    fn test_shutdown_without_init_is_safe() {
        let mut engine = AudioEngine::new(EngineConfig::default());
        engine.shutdown();
        engine.shutdown();
        assert!(!engine.is_initialized());
    }

    #[test]
    fn test_volume_setters_round_trip() {
        let engine = AudioEngine::new(EngineConfig::default());
        engine.set_mic_volume(0.4);
        engine.set_sound_volume(1.9);
        assert_eq!(engine.mic_volume(), 0.4);
        assert_eq!(engine.sound_volume(), 1.9);
    }

    #[test]
    fn test_play_clip_and_stop_all() {
        let engine = AudioEngine::new(EngineConfig::default());
        let clip = MockClip::constant(0.5, 480, engine.config());

        engine.play_clip(Arc::clone(&clip));
        engine.play_clip(clip);
        assert_eq!(engine.active_sound_count(), 2);

        engine.stop_all_sounds();
        assert_eq!(engine.active_sound_count(), 0);
    }

    #[test]
    fn test_play_sound_file_failure_enqueues_nothing() {
        let engine = AudioEngine::new(EngineConfig::default());
        let result = engine.play_sound_file("/nonexistent/honk.wav");
        assert!(result.is_err());
        assert_eq!(engine.active_sound_count(), 0);
    }

    // Requires a machine with real capture and playback devices.
    #[test]
    #[ignore = "requires audio hardware"]
    fn test_init_with_defaults_starts_streams() {
        let mut engine = AudioEngine::new(EngineConfig::default());
        engine.init("", "", "").unwrap();
        assert!(engine.is_initialized());

        // Re-init tears down the previous state first.
        engine.init("", "", "").unwrap();
        assert!(engine.is_initialized());

        engine.shutdown();
        assert!(!engine.is_initialized());
    }
}
