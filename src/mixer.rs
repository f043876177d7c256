//! Additive mixing of in-flight clip playbacks across two output sinks.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use crate::clip::{AudioClip, SinkId};

/// One in-flight playback of a clip.
///
/// Cursors count interleaved samples and only ever advance. A sound is
/// removable only once BOTH sinks have played it to the end: the cable and
/// monitor streams consume at independent rates and must not be coupled.
struct ActiveSound {
    clip: Arc<AudioClip>,
    cursor_cable: usize,
    cursor_monitor: usize,
}

impl ActiveSound {
    fn new(clip: Arc<AudioClip>) -> Self {
        Self {
            clip,
            cursor_cable: 0,
            cursor_monitor: 0,
        }
    }

    fn cursor_mut(&mut self, sink: SinkId) -> &mut usize {
        match sink {
            SinkId::Cable => &mut self.cursor_cable,
            SinkId::Monitor => &mut self.cursor_monitor,
        }
    }

    fn finished(&self) -> bool {
        let end = self.clip.sample_count();
        self.cursor_cable >= end && self.cursor_monitor >= end
    }
}

/// The set of currently playing sounds, shared by both output callbacks and
/// the control thread.
///
/// One mutex guards the set. The control thread acquires it blocking and
/// holds it only for O(1) mutation; the real-time mix passes acquire it
/// non-blocking and skip the pass on contention, so an output callback can
/// never stall behind playback insertion.
///
/// Polyphony is unbounded: the same clip may be started any number of times
/// and each start is an independent playback.
pub struct SoundMixer {
    sounds: Mutex<Vec<ActiveSound>>,
}

impl SoundMixer {
    /// Creates an empty mixer.
    pub fn new() -> Self {
        Self {
            sounds: Mutex::new(Vec::new()),
        }
    }

    /// Starts playing `clip` from the beginning on both sinks.
    ///
    /// Control-thread path: blocks briefly on the lock.
    pub fn start_playback(&self, clip: Arc<AudioClip>) {
        self.lock_sounds().push(ActiveSound::new(clip));
    }

    /// Discards every playing sound.
    ///
    /// The clear is atomic with respect to mixing: an in-progress mix pass
    /// observes the set either fully before or fully after, never partially.
    pub fn stop_all(&self) {
        self.lock_sounds().clear();
    }

    /// Number of sounds currently in flight.
    pub fn active_count(&self) -> usize {
        self.lock_sounds().len()
    }

    /// Adds one pass of sound-effect audio into `out` for the given sink.
    ///
    /// Non-blocking: on lock contention this returns `false` immediately and
    /// leaves `out` untouched. The caller pre-zeroes the block, so a skipped
    /// pass degrades to one silent period rather than a stalled callback.
    ///
    /// On success, `sample * gain` is accumulated into every slot of `out`
    /// and each sound's cursor for `sink` advances, stopping at clip end (no
    /// looping). Sounds finished on both sinks are removed at the end of the
    /// pass.
    pub fn mix(&self, out: &mut [f32], sink: SinkId, gain: f32) -> bool {
        let mut sounds = match self.sounds.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };

        for sound in sounds.iter_mut() {
            let samples = sound.clip.samples();
            let cursor = match sink {
                SinkId::Cable => &mut sound.cursor_cable,
                SinkId::Monitor => &mut sound.cursor_monitor,
            };
            for slot in out.iter_mut() {
                if *cursor >= samples.len() {
                    break;
                }
                *slot += samples[*cursor] * gain;
                *cursor += 1;
            }
        }

        sounds.retain(|sound| !sound.finished());
        true
    }

    fn lock_sounds(&self) -> std::sync::MutexGuard<'_, Vec<ActiveSound>> {
        self.sounds.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SoundMixer {
    fn default() -> Self {
        Self::new()
    }
}

/// Mic and sound-effect gains, readable from any callback without locking.
///
/// Stored as `f32` bit patterns in `AtomicU32`. Relaxed ordering suffices:
/// no other state is published through these values, and taking effect
/// within one callback period is acceptable.
///
/// Values are conventionally in `[0.0, 2.0]` but are not clamped here.
pub struct Volumes {
    mic: AtomicU32,
    sound: AtomicU32,
}

impl Volumes {
    /// Creates volume state with the given initial gains.
    pub fn new(mic: f32, sound: f32) -> Self {
        Self {
            mic: AtomicU32::new(mic.to_bits()),
            sound: AtomicU32::new(sound.to_bits()),
        }
    }

    /// Current microphone gain.
    pub fn mic(&self) -> f32 {
        f32::from_bits(self.mic.load(Ordering::Relaxed))
    }

    /// Sets the microphone gain.
    pub fn set_mic(&self, gain: f32) {
        self.mic.store(gain.to_bits(), Ordering::Relaxed);
    }

    /// Current sound-effect gain.
    pub fn sound(&self) -> f32 {
        f32::from_bits(self.sound.load(Ordering::Relaxed))
    }

    /// Sets the sound-effect gain.
    pub fn set_sound(&self, gain: f32) {
        self.sound.store(gain.to_bits(), Ordering::Relaxed);
    }
}

impl Default for Volumes {
    /// Unity gain on both paths.
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}
