//! Error types for the engine.
//!
//! Errors are split into two categories:
//! - **Control-plane errors** ([`EngineError`]): returned from `init`,
//!   `play_sound_file` and the device queries
//! - **Real-time degradation**: never an error; callbacks drop bounded
//!   amounts of audio and bump the counters in
//!   [`EngineStats`](crate::EngineStats) instead
//!
//! No failure inside an audio callback terminates the process or a stream.

use std::path::PathBuf;

/// Errors surfaced to the control layer.
///
/// These are returned from the non-real-time operations of
/// [`AudioEngine`](crate::AudioEngine). A failed `init` leaves the engine
/// uninitialized; a failed `play_sound_file` leaves the playback set
/// untouched.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The requested output device exists but could not be opened or started.
    ///
    /// Output-device failures are not retried: the control layer decides
    /// whether to re-`init` with a different device.
    #[error("device unavailable: {name} - {reason}")]
    DeviceUnavailable {
        /// Display name of the device (or "system default").
        name: String,
        /// Reason the device could not be used.
        reason: String,
    },

    /// No system default device exists for the given role.
    ///
    /// For capture this is only reported after the named device (if any)
    /// already failed and the default fallback was attempted.
    #[error("no default {role} device configured")]
    NoDefaultDevice {
        /// `"input"` or `"output"`.
        role: &'static str,
    },

    /// An error from the underlying audio library (CPAL).
    #[error("audio backend error: {0}")]
    Backend(String),

    /// A sound file could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors from decoding a sound file into a clip.
///
/// Decoding happens synchronously on the control thread; a decode failure
/// enqueues nothing and is safe to ignore or report upstream.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Path that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The container or codec is not supported.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The container holds no decodable audio track.
    #[error("no audio track found in file")]
    NoAudioTrack,

    /// The stream is malformed beyond per-packet recovery.
    #[error("decode error: {0}")]
    Malformed(String),

    /// Decoding succeeded but produced zero samples.
    #[error("decoded clip contains no samples")]
    EmptyClip,
}
