//! # mixpad
//!
//! Real-time soundboard routing and mixing engine.
//!
//! `mixpad` captures live microphone input, blends it with any number of
//! concurrently playing one-shot sound clips, and feeds two independently
//! clocked output streams: a virtual "cable" device that other software
//! (voice chat, recorders) consumes as a microphone, and a local monitor
//! device so the operator hears the sound effects without hearing themselves.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mixpad::{AudioEngine, EngineConfig};
//!
//! let mut engine = AudioEngine::new(EngineConfig::default());
//!
//! // Empty names mean "system default".
//! engine.init("USB Microphone", "CABLE Input (VB-Audio)", "")?;
//!
//! engine.set_mic_volume(1.0);
//! engine.set_sound_volume(0.8);
//! engine.play_sound_file("airhorn.mp3")?;
//!
//! // ... later
//! engine.stop_all_sounds();
//! engine.shutdown();
//! ```
//!
//! ## Architecture
//!
//! The engine maintains a strict real-time boundary. Three driver-scheduled
//! callback threads run concurrently once [`AudioEngine::init`] succeeds:
//!
//! ```text
//! Capture Callback ──→ Transit Buffer ──┐
//!                                       ├──→ Cable Output (mic + sounds)
//!               SoundMixer ─────────────┤
//!                                       └──→ Monitor Output (sounds only)
//! ```
//!
//! - **Capture Callback**: writes mic frames into the transit buffer, first
//!   discarding stale audio above a fixed latency threshold (anti-lag)
//! - **Transit Buffer**: bounded SPSC ring sized to 100 ms; never grows,
//!   never blocks either side
//! - **SoundMixer**: the set of in-flight clip playbacks, each with an
//!   independent cursor per output sink; real-time threads mix with a
//!   non-blocking lock and skip a pass on contention
//!
//! No callback allocates, blocks, or performs I/O. Under sustained pressure
//! the engine drops audio in bounded amounts rather than letting latency
//! grow; drop counters are exposed via [`AudioEngine::stats`].

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod clip;
mod config;
mod decode;
mod device;
mod engine;
mod error;
mod mixer;
pub mod mock;
mod stage;
mod transit;

pub use clip::{AudioClip, SinkId};
pub use config::EngineConfig;
pub use decode::decode_file;
pub use device::{list_input_devices, list_output_devices, DeviceDescriptor};
pub use engine::{AudioEngine, EngineStats, StatsSnapshot};
pub use error::{DecodeError, EngineError};
pub use mixer::{SoundMixer, Volumes};
pub use stage::{CableStage, CaptureStage, MonitorStage};
pub use transit::{PushReport, TransitBuffer};
