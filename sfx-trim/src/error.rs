//! Error types for sfx-trim
//!
//! Every stage exposes a typed result. Decode failures are terminal for the
//! current source file, transcode failures are terminal only for the current
//! recompute and leave the last good asset in place.

use thiserror::Error;

/// Failure to turn a source blob into a [`SampleBuffer`](crate::audio::SampleBuffer)
///
/// No partial buffer is ever returned alongside one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Container or codec not recognised
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Recognised format, but the data could not be decoded
    #[error("Corrupt audio data: {0}")]
    CorruptData(String),

    /// The host cannot decode audio at all
    #[error("Audio decoding unavailable: {0}")]
    CapabilityUnavailable(String),
}

/// Failure to compress the trimmed WAV into the distributable format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// Encoder program/library not present or not startable
    #[error("Encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// Encoder ran but did not produce usable output
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}

/// A trim region violating `0 <= start`, `start + min_length <= end <= duration`
///
/// Region mutators clamp, so this is unreachable through the public setters.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Invalid trim region {start:.3}s..{end:.3}s (duration {duration:.3}s)")]
pub struct InvalidRegion {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// Main error type for sfx-trim
#[derive(Error, Debug)]
pub enum Error {
    /// Source decoding failed
    #[error("Audio decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Transcoding failed
    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    /// Region out of range
    #[error(transparent)]
    InvalidRegion(#[from] InvalidRegion),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from the shared crate (config files, time field parsing)
    #[error(transparent)]
    Common(#[from] sfx_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request belonged to a source that has since been replaced
    #[error("Superseded by a newer source (generation {generation})")]
    Superseded { generation: u64 },

    /// Submission requested before any asset was produced
    #[error("Nothing to submit: {0}")]
    NothingToSubmit(String),

    /// The pipeline task is gone
    #[error("Trim pipeline stopped")]
    PipelineClosed,
}

/// Convenience Result type using sfx-trim Error
pub type Result<T> = std::result::Result<T, Error>;
