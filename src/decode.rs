//! Sound file decoding via Symphonia.
//!
//! Decoding is synchronous and runs on the control thread; blocking I/O is
//! acceptable there, and the real-time paths only ever see the finished
//! [`AudioClip`]. Whatever the file's native format, the decoded samples are
//! converted to the engine's fixed channel count and sample rate here, never
//! in a callback.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::clip::AudioClip;
use crate::config::EngineConfig;
use crate::error::DecodeError;

/// Decodes `path` into a clip at the engine's fixed format.
///
/// Probes the container, decodes the first audio track packet-by-packet into
/// interleaved `f32`, then converts channels and resamples to the configured
/// format. Corrupted packets are skipped; a stream broken beyond that is an
/// error.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the file cannot be opened, probed, or
/// decoded, or if it yields no samples. Nothing is enqueued on failure.
pub fn decode_file(path: &Path, config: &EngineConfig) -> Result<Arc<AudioClip>, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let format_opts = FormatOptions {
        enable_gapless: true,
        ..Default::default()
    };
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &MetadataOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.channels.is_some())
        .ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let src_rate = codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::Malformed("no sample rate in codec params".to_string()))?;
    let src_channels = codec_params
        .channels
        .map(|c| c.count() as u16)
        .ok_or_else(|| DecodeError::Malformed("no channel info in codec params".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(DecodeError::Malformed(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!(error = %msg, "skipping corrupted audio packet");
                continue;
            }
            Err(e) => return Err(DecodeError::Malformed(e.to_string())),
        };

        if decoded.frames() == 0 {
            continue;
        }

        let spec = *decoded.spec();
        let mut buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if samples.is_empty() {
        return Err(DecodeError::EmptyClip);
    }

    let samples = convert_channels(&samples, src_channels, config.channels);
    let samples = resample_linear(&samples, src_rate, config.sample_rate, config.channels);

    debug!(
        path = %path.display(),
        frames = samples.len() / config.channels.max(1) as usize,
        src_rate,
        src_channels,
        "decoded clip"
    );

    Ok(AudioClip::shared(samples, config.sample_rate, config.channels))
}

/// Re-lays interleaved samples from `from` channels to `to` channels.
///
/// Mono fans out to every target channel; wider layouts keep the front pair
/// for stereo targets and downmix by averaging otherwise.
fn convert_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == to {
        return samples.to_vec();
    }
    let from = from.max(1) as usize;
    let to = to.max(1) as usize;

    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else if to == 2 {
            out.push(frame[0]);
            out.push(frame[1]);
        } else {
            let mono = frame.iter().sum::<f32>() / from as f32;
            out.extend(std::iter::repeat(mono).take(to));
        }
    }
    out
}

/// Linear-interpolation resampling of interleaved samples.
///
/// Good enough for short one-shot effects; clip decode is the only caller,
/// so the quality/complexity trade-off stays off the real-time path.
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32, channels: u16) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let ch = channels.max(1) as usize;
    let src_frames = samples.len() / ch;
    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let dst_frames = (src_frames as f64 / ratio).ceil() as usize;

    let mut out = Vec::with_capacity(dst_frames * ch);
    for i in 0..dst_frames {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;
        for c in 0..ch {
            let a = samples.get(idx * ch + c).copied().unwrap_or(0.0);
            let b = samples.get((idx + 1) * ch + c).copied().unwrap_or(a);
            out.push(a + (b - a) * frac);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_mono_to_stereo_duplicates() {
        let stereo = convert_channels(&[0.1, 0.2], 1, 2);
        assert_eq!(stereo, vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_convert_stereo_to_mono_averages() {
        let mono = convert_channels(&[0.2, 0.4, -1.0, 1.0], 2, 1);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert_eq!(mono[1], 0.0);
    }

    #[test]
    fn test_convert_same_layout_is_identity() {
        let samples = vec![0.5, -0.5, 0.25, -0.25];
        assert_eq!(convert_channels(&samples, 2, 2), samples);
    }

    #[test]
    fn test_resample_doubles_frames_when_upsampling_2x() {
        let samples = vec![0.0, 0.0, 1.0, 1.0]; // 2 stereo frames
        let out = resample_linear(&samples, 24_000, 48_000, 2);
        assert_eq!(out.len(), 8);
        // Midpoint frame is interpolated.
        assert!((out[2] - 0.5).abs() < 1e-6);
        assert!((out[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample_linear(&samples, 48_000, 48_000, 2), samples);
    }

    #[test]
    fn test_decode_missing_file_reports_open_error() {
        let config = EngineConfig::default();
        let result = decode_file(Path::new("/nonexistent/honk.wav"), &config);
        assert!(matches!(result, Err(DecodeError::Open { .. })));
    }
}
