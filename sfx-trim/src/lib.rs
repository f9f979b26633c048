//! # sfx-trim
//!
//! Audio capture-and-trim core for sound effect uploads.
//!
//! An uploaded file is decoded into a [`SampleBuffer`], the user picks a
//! sub-range through [`TrimController`], and [`TrimPipeline`] keeps an MP3 of
//! that range ready to submit: slice, serialize to WAV, transcode, debounced
//! so only the last edit in a burst is ever encoded.
//!
//! Decoding and encoding are capabilities ([`AudioDecoder`], [`Transcoder`]);
//! [`SymphoniaDecoder`] and [`FfmpegTranscoder`] are the stock implementations.

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod preview;
pub mod transcode;
pub mod trim;

pub use audio::{AudioDecoder, EncodedAsset, FormatHint, SampleBuffer, SymphoniaDecoder};
pub use config::TomlConfig;
pub use error::{DecodeError, Error, InvalidRegion, Result, TranscodeError};
pub use events::TrimEvent;
pub use pipeline::{PipelineHandle, PipelineStatus, SourceInfo, TrimPipeline};
pub use preview::{MediaPlayback, PlaybackState, PreviewTransport};
pub use transcode::{FfmpegTranscoder, Transcoder};
pub use trim::{TrimController, TrimRegion, TrimUpdate};
