//! Test helper modules for sfx-trim integration tests
//!
//! - audio_generator: WAV fixtures written with hound
//! - mock_codecs: decoder/transcoder stand-ins with call accounting

#![allow(dead_code)]

pub mod audio_generator;
pub mod mock_codecs;

pub use audio_generator::{ramp_buffer, sine_wav_bytes, write_sine_wav, TEST_SAMPLE_RATE};
pub use mock_codecs::{
    DurationByteDecoder, GatedDecoder, MockDecoder, MockTranscoder, PanickingDecoder,
};
