//! Core audio data types
//!
//! Defines the decoded sample buffer handed between pipeline stages and the
//! encoded asset produced at the end of the pipeline.

use crate::trim::TrimRegion;

/// MIME type of the distributable asset
pub const ASSET_MIME: &str = "audio/mpeg";

/// SampleBuffer holds decoded audio for one source.
///
/// **Format:**
/// - Planar: one `Vec<f32>` per channel, all of equal length
/// - Samples are f32 in [-1.0, 1.0] (clamped on construction)
/// - Sample rate is the source's native rate (no resampling)
///
/// Immutable once built. Slicing produces a new buffer rather than mutating
/// this one.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

/// Reasons a set of channel vectors cannot form a SampleBuffer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferShapeError {
    #[error("sample rate must be non-zero")]
    ZeroSampleRate,
    #[error("buffer needs 1..=255 channels, got {0}")]
    ChannelCount(usize),
    #[error("channel {channel} has {len} frames, expected {expected}")]
    RaggedChannels {
        channel: usize,
        len: usize,
        expected: usize,
    },
    #[error("interleaved sample count {len} is not a multiple of {channels} channels")]
    PartialFrame { len: usize, channels: usize },
}

impl SampleBuffer {
    /// Build from planar channel data, clamping every sample into [-1.0, 1.0].
    pub fn new(sample_rate: u32, mut channels: Vec<Vec<f32>>) -> Result<Self, BufferShapeError> {
        if sample_rate == 0 {
            return Err(BufferShapeError::ZeroSampleRate);
        }
        if channels.is_empty() || channels.len() > u8::MAX as usize {
            return Err(BufferShapeError::ChannelCount(channels.len()));
        }

        let expected = channels[0].len();
        for (channel, samples) in channels.iter().enumerate() {
            if samples.len() != expected {
                return Err(BufferShapeError::RaggedChannels {
                    channel,
                    len: samples.len(),
                    expected,
                });
            }
        }

        for samples in channels.iter_mut() {
            for sample in samples.iter_mut() {
                *sample = clamp_sample(*sample);
            }
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Build from channels cut out of an existing valid buffer
    pub(crate) fn from_trusted(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        debug_assert!(sample_rate > 0 && !channels.is_empty());
        debug_assert!(channels.iter().all(|c| c.len() == channels[0].len()));
        Self {
            sample_rate,
            channels,
        }
    }

    /// Build from interleaved samples `[c0, c1, .., c0, c1, ..]`
    pub fn from_interleaved(
        sample_rate: u32,
        channel_count: usize,
        interleaved: &[f32],
    ) -> Result<Self, BufferShapeError> {
        if channel_count == 0 || channel_count > u8::MAX as usize {
            return Err(BufferShapeError::ChannelCount(channel_count));
        }
        if interleaved.len() % channel_count != 0 {
            return Err(BufferShapeError::PartialFrame {
                len: interleaved.len(),
                channels: channel_count,
            });
        }

        let frames = interleaved.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Self::new(sample_rate, channels)
    }

    /// A silent buffer of the given shape
    pub fn silence(
        sample_rate: u32,
        channel_count: u8,
        frame_count: usize,
    ) -> Result<Self, BufferShapeError> {
        Self::new(
            sample_rate,
            vec![vec![0.0; frame_count]; channel_count as usize],
        )
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    pub fn channel_count(&self) -> u8 {
        self.channels.len() as u8
    }

    /// Frames per channel
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Duration in seconds (`frame_count / sample_rate`)
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels, planar
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Frame index for a time offset, truncating fractional frames.
    ///
    /// A tolerance of one millionth of a frame absorbs float error so that
    /// `frame_at(duration_secs())` is exactly `frame_count()`.
    pub fn frame_at(&self, seconds: f64) -> usize {
        const FRAME_EPSILON: f64 = 1e-6;
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (seconds * self.sample_rate as f64 + FRAME_EPSILON).floor() as usize
    }
}

/// Clamp a sample into the normalized range, mapping NaN to silence
pub fn clamp_sample(sample: f32) -> f32 {
    if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    }
}

/// Final output of the pipeline, handed to the upload collaborator on submit.
///
/// Produced fresh by every successful recompute; the previous one is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAsset {
    /// Encoded bytes
    pub bytes: Vec<u8>,

    /// MIME type (`audio/mpeg`)
    pub mime: String,

    /// File name offered to the uploader
    pub suggested_name: String,

    /// Region this asset was encoded from
    pub region: Option<TrimRegion>,
}

impl EncodedAsset {
    /// New MP3 asset without region information
    pub fn mpeg(bytes: Vec<u8>, suggested_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: ASSET_MIME.to_string(),
            suggested_name: suggested_name.into(),
            region: None,
        }
    }

    /// Same bytes under a different file name
    pub fn renamed(mut self, suggested_name: impl Into<String>) -> Self {
        self.suggested_name = suggested_name.into();
        self
    }
}

/// Derive an upload file name from a user-entered title.
///
/// Lowercases, keeps ASCII letters and digits, collapses everything else into
/// single dashes and appends `.mp3`. An empty result falls back to `sound.mp3`.
pub fn suggested_file_name(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("sound");
    }
    slug.push_str(".mp3");
    slug
}
